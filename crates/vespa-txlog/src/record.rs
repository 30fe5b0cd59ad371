use bytes::{Buf, BufMut, Bytes, BytesMut};
use vespa_types::SerialNumber;

/// The kind of operation a transaction-log record carries.
///
/// `ConfigChange` is itself a serial-numbered operation (spec §3: "A
/// configuration change is itself a serial-numbered operation so that
/// replay deterministically reconstructs the feed state under each
/// config"), interleaved with document mutations in the same stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    Put = 0,
    Update = 1,
    Remove = 2,
    ConfigChange = 3,
}

impl RecordKind {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(RecordKind::Put),
            1 => Some(RecordKind::Update),
            2 => Some(RecordKind::Remove),
            3 => Some(RecordKind::ConfigChange),
            _ => None,
        }
    }
}

/// One transaction-log record: `<serial u64><type u8><payload-len
/// u32><payload bytes>` (spec §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRecord {
    serial: SerialNumber,
    kind: RecordKind,
    payload: Bytes,
}

impl TxRecord {
    pub fn new(serial: SerialNumber, kind: RecordKind, payload: Bytes) -> Self {
        Self {
            serial,
            kind,
            payload,
        }
    }

    pub fn serial(&self) -> SerialNumber {
        self.serial
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Encodes the record header + payload. Does not include the
    /// per-segment checksum trailer; that is maintained once per segment
    /// by [`crate::segment::TransactionLog`], matching spec §6
    /// ("checksum at end of each file segment").
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(13 + self.payload.len());
        buf.put_u64(self.serial.get());
        buf.put_u8(self.kind as u8);
        buf.put_u32(self.payload.len() as u32);
        buf.put(self.payload.clone());
        buf.freeze()
    }

    /// Fixed header size in bytes: serial(8) + kind(1) + len(4).
    pub const HEADER_LEN: usize = 13;

    /// Attempts to decode one record from the front of `buf`.
    ///
    /// Returns `Ok(None)` if `buf` does not yet contain a full record
    /// (either the header or the declared payload is truncated) — the
    /// caller treats this as "tolerate a truncated trailing record" (spec
    /// §6) rather than an error, since it is the expected shape of a
    /// segment that was being actively written when the process crashed.
    pub fn try_decode(buf: &[u8]) -> Result<Option<(TxRecord, usize)>, DecodeError> {
        if buf.len() < Self::HEADER_LEN {
            return Ok(None);
        }
        let mut cursor = buf;
        let serial = cursor.get_u64();
        let kind_byte = cursor.get_u8();
        let len = cursor.get_u32() as usize;

        let Some(kind) = RecordKind::from_u8(kind_byte) else {
            return Err(DecodeError::UnknownKind(kind_byte));
        };

        if cursor.remaining() < len {
            return Ok(None);
        }

        let payload = Bytes::copy_from_slice(&cursor[..len]);
        let total = Self::HEADER_LEN + len;
        Ok(Some((
            TxRecord {
                serial: SerialNumber::new(serial),
                kind,
                payload,
            },
            total,
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown record kind byte {0}")]
    UnknownKind(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let rec = TxRecord::new(
            SerialNumber::new(42),
            RecordKind::Put,
            Bytes::from_static(b"hello"),
        );
        let encoded = rec.encode();
        let (decoded, consumed) = TxRecord::try_decode(&encoded).unwrap().unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded, rec);
    }

    #[test]
    fn truncated_header_is_not_an_error() {
        let rec = TxRecord::new(SerialNumber::new(1), RecordKind::Remove, Bytes::from_static(b"x"));
        let encoded = rec.encode();
        let truncated = &encoded[..5];
        assert_eq!(TxRecord::try_decode(truncated).unwrap(), None);
    }

    #[test]
    fn truncated_payload_is_not_an_error() {
        let rec = TxRecord::new(
            SerialNumber::new(1),
            RecordKind::Put,
            Bytes::from_static(b"0123456789"),
        );
        let encoded = rec.encode();
        let truncated = &encoded[..encoded.len() - 3];
        assert_eq!(TxRecord::try_decode(truncated).unwrap(), None);
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let mut buf = BytesMut::new();
        buf.put_u64(1);
        buf.put_u8(200);
        buf.put_u32(0);
        assert!(matches!(
            TxRecord::try_decode(&buf),
            Err(DecodeError::UnknownKind(200))
        ));
    }
}

//! Transaction-log payload codec for feed operations.
//!
//! [`vespa_txlog::TxRecord`] payloads are opaque bytes by design (the
//! typed config schemas live above this crate, spec §9's "reflection
//! collapses to a closed enumeration" applies to config, not to feed
//! payload framing); this module is the one place that gives `Put` /
//! `Update` / `Remove` payloads a concrete wire shape so replay can
//! reconstruct a [`vespa_feed::FeedOp`] from a decoded [`TxRecord`].
//!
//! Layout: `<active u8><doc id utf-8 bytes>` for `Put`; `<doc id utf-8
//! bytes>` for `Update`/`Remove`. `ConfigChange` payloads carry the
//! generation number as an 8-byte big-endian integer; the snapshot
//! content itself is read back from the on-disk generation directory via
//! [`vespa_txlog::FileConfigManager`], not duplicated into the log.

use std::str::FromStr;

use bytes::{Buf, Bytes};
use vespa_feed::FeedOp;
use vespa_types::{ConfigGeneration, DocumentId};

use crate::error::VespaError;

pub fn encode_put(doc_id: &DocumentId, active: bool) -> Bytes {
    let mut buf = Vec::with_capacity(1 + doc_id.as_str().len());
    buf.push(u8::from(active));
    buf.extend_from_slice(doc_id.as_str().as_bytes());
    Bytes::from(buf)
}

pub fn encode_doc_id(doc_id: &DocumentId) -> Bytes {
    Bytes::copy_from_slice(doc_id.as_str().as_bytes())
}

pub fn encode_config_change(generation: ConfigGeneration) -> Bytes {
    let mut buf = Vec::with_capacity(8);
    buf.extend_from_slice(&generation.get().to_be_bytes());
    Bytes::from(buf)
}

fn decode_doc_id(bytes: &[u8]) -> Result<DocumentId, VespaError> {
    let text = std::str::from_utf8(bytes).map_err(|_| VespaError::MalformedPayload("doc id is not valid utf-8"))?;
    DocumentId::from_str(text).map_err(|source| VespaError::InvalidDocumentId(source.to_string()))
}

pub fn decode_put(payload: &[u8]) -> Result<(DocumentId, bool), VespaError> {
    if payload.is_empty() {
        return Err(VespaError::MalformedPayload("put payload missing active flag"));
    }
    let active = payload[0] != 0;
    let doc_id = decode_doc_id(&payload[1..])?;
    Ok((doc_id, active))
}

pub fn decode_update_or_remove(payload: &[u8]) -> Result<DocumentId, VespaError> {
    decode_doc_id(payload)
}

pub fn decode_config_change(mut payload: &[u8]) -> Result<ConfigGeneration, VespaError> {
    if payload.len() < 8 {
        return Err(VespaError::MalformedPayload("config-change payload shorter than 8 bytes"));
    }
    Ok(ConfigGeneration::new(payload.get_u64()))
}

/// Converts a record payload and kind back into the [`FeedOp`] the
/// document DB's replay path expects, for the two kinds that carry one
/// (`ConfigChange` is handled separately by the caller, per spec §4.2's
/// replay/online boundary).
pub fn decode_feed_op(kind: vespa_txlog::RecordKind, payload: &[u8]) -> Result<Option<FeedOp>, VespaError> {
    use vespa_txlog::RecordKind;
    match kind {
        RecordKind::Put => {
            let (doc_id, active) = decode_put(payload)?;
            Ok(Some(FeedOp::Put { doc_id, active }))
        }
        RecordKind::Update => Ok(Some(FeedOp::Update { doc_id: decode_update_or_remove(payload)? })),
        RecordKind::Remove => Ok(Some(FeedOp::Remove { doc_id: decode_update_or_remove(payload)? })),
        RecordKind::ConfigChange => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(key: &str) -> DocumentId {
        DocumentId::from_str(&format!("id:ns:type::{key}")).unwrap()
    }

    #[test]
    fn put_round_trips_with_active_flag() {
        let encoded = encode_put(&doc("a"), true);
        let (decoded, active) = decode_put(&encoded).unwrap();
        assert_eq!(decoded, doc("a"));
        assert!(active);
    }

    #[test]
    fn doc_id_round_trips() {
        let encoded = encode_doc_id(&doc("b"));
        assert_eq!(decode_update_or_remove(&encoded).unwrap(), doc("b"));
    }

    #[test]
    fn config_change_round_trips() {
        let encoded = encode_config_change(ConfigGeneration::new(42));
        assert_eq!(decode_config_change(&encoded).unwrap(), ConfigGeneration::new(42));
    }

    #[test]
    fn empty_put_payload_is_malformed() {
        assert!(decode_put(&[]).is_err());
    }
}

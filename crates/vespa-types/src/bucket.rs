use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document_id::DocumentId;

/// The unit of replication and garbage collection.
///
/// A bucket id is derived from a document id by a stable hash, then
/// truncated to `used_bits` significant bits so that buckets can be split
/// further as the corpus grows (spec §3). The used-bit-count travels with
/// the id itself (rather than being implicit) so two `BucketId`s can be
/// compared for "is a split of" without external context — the same
/// reasoning the original bucket-id encoding uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketId {
    used_bits: u8,
    hash: u64,
}

impl BucketId {
    pub const MAX_USED_BITS: u8 = 58;

    /// Derives the bucket id for a document under the given split level.
    ///
    /// # Panics
    ///
    /// Panics if `used_bits` exceeds [`Self::MAX_USED_BITS`].
    pub fn for_document(doc_id: &DocumentId, used_bits: u8) -> Self {
        assert!(
            used_bits <= Self::MAX_USED_BITS,
            "used_bits {used_bits} exceeds MAX_USED_BITS {}",
            Self::MAX_USED_BITS
        );
        let full_hash = doc_id.stable_hash();
        Self {
            used_bits,
            hash: mask_low_bits(full_hash, used_bits),
        }
    }

    pub const fn used_bits(self) -> u8 {
        self.used_bits
    }

    pub const fn raw_hash(self) -> u64 {
        self.hash
    }

    /// Returns the two children produced by splitting this bucket by one
    /// more bit.
    pub fn split(self) -> (BucketId, BucketId) {
        let next_bits = self.used_bits + 1;
        assert!(
            next_bits <= Self::MAX_USED_BITS,
            "cannot split past MAX_USED_BITS"
        );
        let bit = 1u64 << self.used_bits;
        (
            BucketId {
                used_bits: next_bits,
                hash: self.hash,
            },
            BucketId {
                used_bits: next_bits,
                hash: self.hash | bit,
            },
        )
    }

    /// Returns true if `other` is this bucket further split (a descendant
    /// with the same low bits and a higher `used_bits`).
    pub fn contains(self, other: BucketId) -> bool {
        other.used_bits >= self.used_bits
            && mask_low_bits(other.hash, self.used_bits) == self.hash
    }
}

fn mask_low_bits(hash: u64, bits: u8) -> u64 {
    if bits == 0 {
        0
    } else if bits >= 64 {
        hash
    } else {
        hash & ((1u64 << bits) - 1)
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BucketId(0x{:x}, bits={})", self.hash, self.used_bits)
    }
}

/// The implicit bucket space a bucket belongs to.
///
/// Global buckets must converge before default-space merges proceed when
/// `inhibitDefaultMergesWhenGlobalMergesPending` is set (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketSpace {
    Default,
    Global,
}

impl BucketSpace {
    pub const fn is_global(self) -> bool {
        matches!(self, BucketSpace::Global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(key: &str) -> DocumentId {
        format!("id:ns:type::{key}").parse().unwrap()
    }

    #[test]
    fn same_document_same_bucket() {
        let a = BucketId::for_document(&doc("k1"), 16);
        let b = BucketId::for_document(&doc("k1"), 16);
        assert_eq!(a, b);
    }

    #[test]
    fn split_produces_distinguishable_children() {
        let parent = BucketId::for_document(&doc("k1"), 8);
        let (lo, hi) = parent.split();
        assert_ne!(lo, hi);
        assert!(parent.contains(lo));
        assert!(parent.contains(hi));
        assert!(!lo.contains(parent));
    }

    #[test]
    #[should_panic(expected = "exceeds MAX_USED_BITS")]
    fn rejects_excessive_used_bits() {
        let _ = BucketId::for_document(&doc("k1"), 200);
    }
}

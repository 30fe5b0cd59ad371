use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle into an array/attribute store: `(bufferId, offset)`.
///
/// `EntryRef::NULL` is the sentinel for the null/empty-array slot (spec
/// §4.3: "`0` is the null/empty-array sentinel"). Packed into a single
/// `u32` the way the teacher's offset/position handles are packed, so refs
/// stay `Copy` and fit in the same word as a pointer-sized root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryRef {
    buffer_id: u16,
    offset: u32,
}

impl EntryRef {
    /// The null/empty-array sentinel: buffer 0, offset 0.
    pub const NULL: EntryRef = EntryRef {
        buffer_id: 0,
        offset: 0,
    };

    pub const fn new(buffer_id: u16, offset: u32) -> Self {
        Self { buffer_id, offset }
    }

    pub const fn buffer_id(self) -> u16 {
        self.buffer_id
    }

    pub const fn offset(self) -> u32 {
        self.offset
    }

    pub const fn is_null(self) -> bool {
        self.buffer_id == 0 && self.offset == 0
    }

    /// Packs this ref into a single `u64` so it can be stored behind an
    /// `AtomicU64` pointer root for release-fenced compaction rewrites
    /// (spec §4.3).
    pub const fn to_bits(self) -> u64 {
        ((self.buffer_id as u64) << 32) | self.offset as u64
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self {
            buffer_id: (bits >> 32) as u16,
            offset: bits as u32,
        }
    }
}

impl Default for EntryRef {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryRef({}, {})", self.buffer_id, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_zero_zero() {
        assert!(EntryRef::NULL.is_null());
        assert!(EntryRef::default().is_null());
        assert!(!EntryRef::new(1, 0).is_null());
    }

    #[test]
    fn bits_round_trip() {
        let r = EntryRef::new(7, 1234);
        assert_eq!(EntryRef::from_bits(r.to_bits()), r);
    }
}

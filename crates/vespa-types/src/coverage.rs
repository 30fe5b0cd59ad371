use serde::{Deserialize, Serialize};

/// Bit flags recording why a query result is degraded (spec §3, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DegradationReason(u8);

impl DegradationReason {
    pub const NONE: DegradationReason = DegradationReason(0);
    pub const MATCH_PHASE: DegradationReason = DegradationReason(1 << 0);
    pub const TIMEOUT: DegradationReason = DegradationReason(1 << 1);
    pub const ADAPTIVE_TIMEOUT: DegradationReason = DegradationReason(1 << 2);

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: DegradationReason) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn union(self, other: DegradationReason) -> DegradationReason {
        DegradationReason(self.0 | other.0)
    }
}

impl std::ops::BitOr for DegradationReason {
    type Output = DegradationReason;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// `(docs, active docs, soon-active docs, nodes, nodes-tried,
/// degradation-reason-bits)` — spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoverageRecord {
    pub docs: u64,
    pub active_docs: u64,
    pub soon_active_docs: u64,
    pub nodes: u32,
    pub nodes_tried: u32,
    pub degraded_by: DegradationReason,
}

impl CoverageRecord {
    pub fn new(docs: u64, active_docs: u64, nodes: u32) -> Self {
        Self {
            docs,
            active_docs,
            soon_active_docs: 0,
            nodes,
            nodes_tried: nodes,
            degraded_by: DegradationReason::NONE,
        }
    }

    /// Merges a second reply's coverage into this one, per spec §4.4 merge
    /// rules: sum docs, sum active, take min(full) across replies, union
    /// the degradation bits.
    #[must_use]
    pub fn merged_with(self, other: CoverageRecord) -> CoverageRecord {
        CoverageRecord {
            docs: self.docs + other.docs,
            active_docs: self.active_docs + other.active_docs,
            soon_active_docs: self.soon_active_docs + other.soon_active_docs,
            nodes: self.nodes + other.nodes,
            nodes_tried: self.nodes_tried + other.nodes_tried,
            degraded_by: self.degraded_by | other.degraded_by,
        }
    }

    pub fn is_full(self) -> bool {
        self.degraded_by.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_docs_and_unions_degradation() {
        let a = CoverageRecord {
            degraded_by: DegradationReason::TIMEOUT,
            ..CoverageRecord::new(10, 8, 1)
        };
        let b = CoverageRecord::new(5, 5, 1);
        let merged = a.merged_with(b);
        assert_eq!(merged.docs, 15);
        assert_eq!(merged.active_docs, 13);
        assert_eq!(merged.nodes, 2);
        assert!(merged.degraded_by.contains(DegradationReason::TIMEOUT));
        assert!(!merged.is_full());
    }

    #[test]
    fn full_coverage_has_no_degradation() {
        let merged = CoverageRecord::new(1, 1, 1).merged_with(CoverageRecord::new(1, 1, 1));
        assert!(merged.is_full());
    }
}

use serde::{Deserialize, Serialize};

use crate::document_id::GlobalId;

/// A single ranked result: `(global-id, relevance score, partition id,
/// distribution key)`, optionally marked `meta` (spec §3).
///
/// Ordering implements the stable tie-break from spec §5: score descending,
/// distribution-key ascending, global-id ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    global_id: GlobalId,
    relevance: f64,
    partition_id: u32,
    distribution_key: u16,
    meta: bool,
}

impl Hit {
    pub fn new(global_id: GlobalId, relevance: f64, partition_id: u32, distribution_key: u16) -> Self {
        Self {
            global_id,
            relevance,
            partition_id,
            distribution_key,
            meta: false,
        }
    }

    pub fn meta(global_id: GlobalId, partition_id: u32, distribution_key: u16) -> Self {
        Self {
            global_id,
            relevance: f64::NEG_INFINITY,
            partition_id,
            distribution_key,
            meta: true,
        }
    }

    pub fn global_id(&self) -> GlobalId {
        self.global_id
    }

    pub fn relevance(&self) -> f64 {
        self.relevance
    }

    pub fn partition_id(&self) -> u32 {
        self.partition_id
    }

    pub fn distribution_key(&self) -> u16 {
        self.distribution_key
    }

    pub fn is_meta(&self) -> bool {
        self.meta
    }

    /// Total order used for merge/sort: score descending, then
    /// distribution-key ascending, then global-id ascending (spec §5).
    /// Meta hits are handled separately by callers (they bypass ranking).
    pub fn rank_cmp(&self, other: &Hit) -> std::cmp::Ordering {
        other
            .relevance
            .partial_cmp(&self.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| self.distribution_key.cmp(&other.distribution_key))
            .then_with(|| self.global_id.cmp(&other.global_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gid(seed: u8) -> GlobalId {
        GlobalId::from_bytes([seed; 12])
    }

    #[test]
    fn higher_score_sorts_first() {
        let a = Hit::new(gid(1), 9.0, 0, 0);
        let b = Hit::new(gid(2), 5.0, 0, 0);
        assert_eq!(a.rank_cmp(&b), std::cmp::Ordering::Less);
    }

    #[test]
    fn tie_break_on_distribution_key_then_global_id() {
        let a = Hit::new(gid(5), 1.0, 0, 1);
        let b = Hit::new(gid(1), 1.0, 0, 2);
        assert_eq!(a.rank_cmp(&b), std::cmp::Ordering::Less);

        let c = Hit::new(gid(1), 1.0, 0, 1);
        let d = Hit::new(gid(2), 1.0, 0, 1);
        assert_eq!(c.rank_cmp(&d), std::cmp::Ordering::Less);
    }
}

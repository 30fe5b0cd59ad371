//! Node facades: wire the per-subsystem crates into the two node roles
//! the spec describes (content node, search node) behind one entry point
//! each, wiring storage + replication + routing behind a single daemon
//! process.
//!
//! Neither facade performs network I/O itself; both are driven by the
//! [`crate::executor`] seams and report through
//! `vespa_types::metrics::{Counter, Gauge}`, so a surrounding process
//! supplies the real transport/threads while this crate supplies the
//! decision logic.

use vespa_distributor::{
    ActivationInhibitConfig, ActivationInhibitor, BucketModel, GcSchedule, MergeThrottle, MergeThrottleMetrics,
};
use vespa_feed::{DocumentDb, FeedOp, FeedOutcome};
use vespa_storage::{ResourceSampler, WriteBlockFilter, WriteBlockFilterConfig};
use vespa_types::SerialNumber;

use crate::error::ServerError;

/// A content node: owns the bucket model, GC scheduling, merge admission,
/// and activation inhibition for the buckets it is responsible for (spec
/// §4.5).
pub struct ContentNode {
    pub buckets: BucketModel,
    pub gc_schedule: GcSchedule,
    pub merge_throttle: MergeThrottle,
    pub merge_metrics: MergeThrottleMetrics,
    pub activation_inhibitor: ActivationInhibitor,
}

impl ContentNode {
    pub fn new(used_bucket_bits: u8, merge_policy_name: &str) -> Self {
        Self {
            buckets: BucketModel::new(used_bucket_bits),
            gc_schedule: GcSchedule::default(),
            merge_throttle: MergeThrottle::from_policy_name(
                merge_policy_name,
                vespa_distributor::StaticPolicyConfig::default(),
                vespa_distributor::DynamicPolicyConfig::default(),
            ),
            merge_metrics: MergeThrottleMetrics::default(),
            activation_inhibitor: ActivationInhibitor::new(ActivationInhibitConfig::default()),
        }
    }

    /// Attempts to admit one merge, honoring both the merge throttle
    /// (spec §4.5 "Merge throttling") and the activation inhibitor (spec
    /// §4.5 "Activation inhibit") when the merge targets the default
    /// bucket space.
    pub fn try_admit_merge(
        &mut self,
        kind: vespa_distributor::MergeKind,
        group: u32,
        space: vespa_types::BucketSpace,
    ) -> vespa_distributor::AdmitDecision {
        if space == vespa_types::BucketSpace::Default {
            let pending: Vec<_> = self.buckets.pending_global_buckets().collect();
            if self.activation_inhibitor.should_inhibit(group, pending.into_iter()) {
                return vespa_distributor::AdmitDecision::Queue;
            }
        }
        self.merge_throttle.try_admit(kind, &self.merge_metrics)
    }
}

/// A search node: the live document DB plus the resource gate that feeds
/// must pass before being accepted (spec §4.2, §4.6).
pub struct SearchNode {
    pub db: DocumentDb,
    pub sampler: ResourceSampler,
    pub write_block: WriteBlockFilter,
}

impl SearchNode {
    pub fn new(replay_capacity: usize, live_capacity: usize) -> Self {
        Self {
            db: DocumentDb::new(replay_capacity, live_capacity),
            sampler: ResourceSampler::new(0.3),
            write_block: WriteBlockFilter::new(WriteBlockFilterConfig::default()),
        }
    }

    /// Accepts one feed operation, first checking the write-block filter
    /// (spec §4.6: "rejects feed operations ... when any resource exceeds
    /// its configured ratio") before handing off to the document DB.
    pub fn feed(&mut self, op: FeedOp, serial: SerialNumber) -> Result<FeedOutcome, ServerError> {
        self.write_block.check(&self.sampler)?;
        Ok(self.db.feed(op, serial)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use vespa_distributor::MergeKind;
    use vespa_storage::ResourceUsage;
    use vespa_types::{BucketSpace, DocumentId};

    #[test]
    fn search_node_rejects_feed_above_resource_limit() {
        let mut node = SearchNode::new(4, 4);
        node.db.start_replay();
        node.db.finish_replay_apply_config(vespa_types::ConfigSnapshot::new(
            vespa_types::ConfigGeneration::new(1),
            false,
        ));
        node.sampler.record(ResourceUsage { disk_used_ratio: 0.95, memory_used_ratio: 0.1 });

        let doc_id = DocumentId::from_str("id:ns:type::a").unwrap();
        let result = node.feed(FeedOp::Put { doc_id, active: true }, SerialNumber::new(1));
        assert!(result.is_err());
    }

    #[test]
    fn search_node_accepts_feed_under_resource_limit() {
        let mut node = SearchNode::new(4, 4);
        node.db.start_replay();
        node.db.finish_replay_apply_config(vespa_types::ConfigSnapshot::new(
            vespa_types::ConfigGeneration::new(1),
            false,
        ));
        node.sampler.record(ResourceUsage::zero());

        let doc_id = DocumentId::from_str("id:ns:type::a").unwrap();
        let outcome = node.feed(FeedOp::Put { doc_id, active: true }, SerialNumber::new(1)).unwrap();
        assert_eq!(outcome, FeedOutcome::Applied);
    }

    #[test]
    fn content_node_falls_back_to_static_for_unknown_policy() {
        let node = ContentNode::new(8, "nonexistent-policy");
        assert!(matches!(node.merge_throttle, MergeThrottle::Static { .. }));
    }

    #[test]
    fn content_node_admits_merge_when_not_inhibited() {
        let mut node = ContentNode::new(8, "static");
        let decision = node.try_admit_merge(MergeKind::Normal, 0, BucketSpace::Default);
        assert_eq!(decision, vespa_distributor::AdmitDecision::Admit);
    }
}

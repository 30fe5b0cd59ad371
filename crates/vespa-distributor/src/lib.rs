//! # vespa-distributor: bucket distribution and merge throttling
//!
//! The content-layer half of the serving-path core (spec §4.5): mapping
//! document ids to buckets and replicas, driving garbage collection,
//! coordinating three-phase updates, throttling concurrent merges, and
//! inhibiting default-space activation while the global space has not yet
//! converged.

pub mod activation_inhibit;
pub mod bucket_model;
pub mod error;
pub mod gc;
pub mod merge_throttle;
pub mod three_phase;

pub use activation_inhibit::{ActivationInhibitConfig, ActivationInhibitor};
pub use bucket_model::{BucketInfo, BucketModel, NodeId};
pub use error::DistributorError;
pub use gc::{GcSchedule, GcSelection, GcSweepResult};
pub use merge_throttle::{
    AdmitDecision, DynamicPolicyConfig, MergeKind, MergeThrottle, MergeThrottleMetrics, StaticPolicyConfig,
};
pub use three_phase::{ReplicaMetadata, ThreePhaseUpdate};

//! # Vespa: serving-path core
//!
//! Vespa is a big-data serving engine combining a content storage layer
//! (bucketed, replicated document storage with distributors) with a
//! real-time search layer (per-schema document databases, matching,
//! ranking, and a dispatcher that interleaves results across shards).
//! This crate is the serving-path core of that engine: bucket
//! distribution and merge throttling, the per-node document database
//! feed pipeline, and query dispatch/interleaving. Deployment,
//! cluster-management, billing, and CLI argument parsing are external
//! collaborators — see `vespa-server::cli` for the typed interface they
//! target.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              vespa                                  │
//! │  ┌──────────┐  ┌───────────┐  ┌───────────┐  ┌──────────────┐   │
//! │  │  txlog   │→ │   feed    │→ │  storage  │  │  distributor │   │
//! │  │ (replay) │  │(DocumentDb│  │(attributes│  │(buckets, GC, │   │
//! │  │          │  │ reconfig) │  │  sampler) │  │   merges)    │   │
//! │  └──────────┘  └───────────┘  └───────────┘  └──────────────┘   │
//! │                       ↕                             ↕             │
//! │                  ┌──────────┐                ┌────────────┐      │
//! │                  │ dispatch │                │   config   │      │
//! │                  │(fan-out, │                │(subscribe, │      │
//! │                  │ coverage)│                │graph swap) │      │
//! │                  └──────────┘                └────────────┘      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use vespa::{Vespa, VespaConfig};
//!
//! let vespa = Vespa::open(VespaConfig::new("./data")).unwrap();
//! println!("{} docs online", vespa.search.db.get_num_docs());
//! ```

mod codec;
mod error;
#[allow(clippy::module_inception)]
mod vespa;

pub use error::VespaError;
pub use vespa::{Vespa, VespaConfig};

// Re-export the subsystem crates' primary types so a consumer of `vespa`
// rarely needs to depend on the `vespa-*` crates directly.
pub use vespa_config::{
    BackoffPolicy, ComponentGraph, ConfigError, DocumentTypeDescriptor, DocumentTypeRegistry, SubscriptionSet,
};
pub use vespa_dispatch::{
    merge_and_page, run_interleaved, AdaptiveTimeoutConfig, DispatchError, MergeQuery, MergedResult,
    NearestNeighborBlueprint, ShardId, ShardTimeline,
};
pub use vespa_distributor::{
    ActivationInhibitor, AdmitDecision, BucketModel, DistributorError, GcSchedule, MergeThrottle,
};
pub use vespa_feed::{DbState, DocumentDb, FeedError, FeedOp, FeedOutcome};
pub use vespa_server::{cli, ContentNode, SearchNode, ServerError};
pub use vespa_storage::{ArrayStore, ResourceSampler, WriteBlockFilter};
pub use vespa_txlog::{FileConfigManager, TransactionLog, TxLogError};
pub use vespa_types::{
    BucketId, BucketSpace, ConfigGeneration, ConfigSnapshot, CoverageRecord, DegradationReason, DocumentId, Hit,
    SerialNumber,
};

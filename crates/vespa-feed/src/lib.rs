//! # vespa-feed: document DB feed pipeline (spec §4.2)
//!
//! Generalizes the teacher's `Runtime<Clock, Storage, Network>` split
//! (`kmb-kernel/src/runtime.rs`, `kmb-kernel/src/traits.rs`) from
//! "execute kernel effects against pluggable infra" to "run a document
//! DB's feed/search/reconfigure surface against a pluggable clock and
//! transaction log," so tests drive the startup sequence and visibility
//! delay deterministically instead of against a wall clock.

mod clock;
mod document_db;
mod error;
mod flush;
mod reconfig;
mod subdb;
mod throttle;
mod visibility;

pub use clock::{Clock, SystemClock};
pub use document_db::{DbState, DocumentDb, FeedOp, FeedOutcome};
pub use error::FeedError;
pub use flush::FlushTarget;
pub use reconfig::ReconfigParams;
pub use subdb::{SubDbCounts, SubDbKind};
pub use throttle::{TokenBucket, TokenKind};
pub use visibility::VisibilityQueue;

//! # vespa-storage: array/attribute store and resource sampling
//!
//! Implements spec §4.3 (the content-addressed slab allocator behind an
//! attribute field's values) and spec §4.6 (the disk/memory sampler and
//! write-block filter). Allocates one small or large array at a time and
//! reclaims it once every reader generation that observed it has
//! drained.

mod array_store;
mod sampler;
mod write_block_filter;

pub use array_store::{ArrayStore, ArrayStoreConfig, CompactionContext, CompactionStats};
pub use sampler::{ResourceSampler, ResourceUsage, TransientUsageProvider};
pub use write_block_filter::{WriteBlockFilter, WriteBlockFilterConfig, WriteBlockReason};

//! # vespa-dispatch: query fan-out, nearest-neighbor planning, and coverage
//!
//! The search-layer half of the serving-path core (spec §4.4): planning
//! nearest-neighbor search leaves (brute-force vs. approximate index,
//! cell-type conversion) and merging per-shard replies into one ranked,
//! coverage-accounted response under an adaptive deadline.

pub mod cell_type;
pub mod error;
pub mod invoker;
pub mod nearest_neighbor;
pub mod topk;

pub use cell_type::{convert_tensor, CellType};
pub use error::DispatchError;
pub use invoker::{
    merge_and_page, run_interleaved, AdaptiveTimeoutConfig, MergeQuery, MergedResult, ShardId, ShardTimeline,
};
pub use nearest_neighbor::{
    DistanceMetric, GeoBoundingBox, GlobalFilter, NearestNeighborBlueprint, NearestNeighborParams, SearchStrategy,
};
pub use topk::reduced_k;

use thiserror::Error;
use vespa_types::CoreError;

#[derive(Debug, Error)]
pub enum DistributorError {
    #[error("bucket {bucket} has no replicas known to this distributor")]
    NoReplicas { bucket: String },

    #[error("merge policy name {0:?} is not recognized, falling back to static")]
    UnknownMergePolicy(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

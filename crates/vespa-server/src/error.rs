//! Server-level error taxonomy, composing each subsystem's own error type
//! (spec §7): one enum per crate boundary the server crosses, each
//! variant wrapping the subsystem's own `thiserror` type via `#[from]`.

use thiserror::Error;

use vespa_config::ConfigError;
use vespa_dispatch::DispatchError;
use vespa_distributor::DistributorError;
use vespa_feed::FeedError;
use vespa_txlog::TxLogError;
use vespa_types::CoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    TxLog(#[from] TxLogError),

    #[error(transparent)]
    Distributor(#[from] DistributorError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("executor shut down before the submitted task could run")]
    ExecutorShutDown,
}

impl ServerError {
    /// Whether local recovery (retry/back-off/degrade) applies, vs.
    /// surfacing to the operator or stopping the affected generation
    /// (spec §7, "Propagation").
    pub fn is_retriable(&self) -> bool {
        match self {
            ServerError::Config(e) => e.is_retriable(),
            ServerError::Core(e) | ServerError::Feed(FeedError::Core(e)) | ServerError::Dispatch(DispatchError::Core(e)) | ServerError::Distributor(DistributorError::Core(e)) => {
                e.is_retriable()
            }
            _ => false,
        }
    }
}

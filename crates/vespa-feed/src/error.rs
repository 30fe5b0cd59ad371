use thiserror::Error;
use vespa_types::CoreError;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed() called before init/replay has started")]
    NotStarted,

    #[error("replay encountered a record for a sub-DB that does not exist")]
    UnknownSubDb,

    #[error("schema change for {config_id} would reduce a field's representational capacity without an override")]
    CapacityReduction { config_id: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    TxLog(#[from] vespa_txlog::TxLogError),
}

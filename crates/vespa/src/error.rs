use thiserror::Error;

use vespa_server::ServerError;

#[derive(Debug, Error)]
pub enum VespaError {
    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    TxLog(#[from] vespa_txlog::TxLogError),

    #[error(transparent)]
    Feed(#[from] vespa_feed::FeedError),

    #[error("malformed transaction log payload: {0}")]
    MalformedPayload(&'static str),

    #[error("invalid document id in transaction log payload: {0}")]
    InvalidDocumentId(String),
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxLogError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupted record at serial {serial} in {path:?}: {reason}")]
    CorruptedRecord {
        path: PathBuf,
        serial: u64,
        reason: String,
    },

    #[error("config generation {generation} missing required file {file}")]
    MissingConfigFile { generation: u64, file: &'static str },

    #[error("serialization error: {0}")]
    Serialization(String),
}

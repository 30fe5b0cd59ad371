//! Config subscription error taxonomy (spec §7), wrapping the shared
//! [`vespa_types::CoreError`] taxonomy.

use thiserror::Error;
use vespa_types::CoreError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("transport failure fetching config: {0}")]
    Transport(String),

    #[error("server returned well-formed but semantically invalid config: {0}")]
    SemanticallyInvalid(String),

    #[error("acquireSnapshot timed out before a matching generation arrived")]
    Timeout,

    #[error("subscription set is closed")]
    Closed,

    #[error("subscribe() called after the set left OPEN state")]
    NotOpen,

    /// Two document types registered under the same id without an
    /// explicit override (spec §9: `DocumentTypeManager.registerSingleType`'s
    /// warning-not-throw branch becomes a hard error here).
    #[error("document type {0:?} already registered for this generation")]
    DocumentTypeConflict(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ConfigError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, ConfigError::Transport(_) | ConfigError::Timeout)
    }
}

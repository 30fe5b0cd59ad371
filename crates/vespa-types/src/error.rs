//! The shared error taxonomy from spec §7.
//!
//! Every crate's own error type wraps the variant that applies to it via
//! `#[from]`: one `thiserror` enum per crate boundary that still composes
//! with this shared core error, which is the cross-crate glue those
//! per-crate enums plug into.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error taxonomy. Local recovery (retry, back-off, degrade)
/// happens at the executor boundary and does not necessarily surface one
/// of these; this is what crosses a crate boundary when it doesn't.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Retriable with back-off: e.g. RPC connection loss.
    #[error("transient transport failure: {0}")]
    TransientTransport(String),

    /// Server replied with a descriptive error. Treated as transient unless
    /// it is a schema-rejection from config, in which case the caller
    /// should treat it as [`CoreError::ConfigurationInvalid`] instead.
    #[error("remote semantic error: {0}")]
    RemoteSemantic(String),

    /// Hard stop for the affected generation; the previous generation is
    /// retained.
    #[error("configuration generation {generation} is invalid: {reason}")]
    ConfigurationInvalid { generation: u64, reason: String },

    /// Fatal at node scope: transaction log or on-disk config corruption.
    #[error("data corruption in {path:?} at serial {serial:?}: {reason}")]
    DataCorruption {
        path: PathBuf,
        serial: Option<u64>,
        reason: String,
    },

    /// Disk or memory usage above configured threshold; feed is
    /// write-blocked, reads continue.
    #[error("resource exhausted: {resource} at {used_ratio:.2} (limit {limit_ratio:.2})")]
    ResourceExhausted {
        resource: &'static str,
        used_ratio: f64,
        limit_ratio: f64,
    },

    /// Invariant violation. Always fatal; callers should log with
    /// `tracing::error!` including full context before unwinding, per spec
    /// §7 ("always fatal and logged with stack").
    #[error("logic violation: {0}")]
    LogicViolation(String),
}

impl CoreError {
    /// Whether local recovery (retry with back-off) is appropriate, vs.
    /// surfacing to the operator / stopping the affected generation.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            CoreError::TransientTransport(_) | CoreError::RemoteSemantic(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_remote_semantic_are_retriable() {
        assert!(CoreError::TransientTransport("x".into()).is_retriable());
        assert!(CoreError::RemoteSemantic("x".into()).is_retriable());
    }

    #[test]
    fn configuration_invalid_is_not_retriable() {
        let err = CoreError::ConfigurationInvalid {
            generation: 3,
            reason: "bad schema".into(),
        };
        assert!(!err.is_retriable());
    }
}

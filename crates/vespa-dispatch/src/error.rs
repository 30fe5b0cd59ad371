use thiserror::Error;
use vespa_types::CoreError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("cannot convert query tensor cell type {from:?} to attribute cell type {to:?}: no implicit conversion path")]
    UnsupportedCellConversion { from: String, to: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

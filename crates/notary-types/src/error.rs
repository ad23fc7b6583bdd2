use thiserror::Error;

/// Errors produced by type-level validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid id {id:?}: {reason}")]
    InvalidId { id: String, reason: String },

    #[error("invalid transaction id: {0}")]
    InvalidTxId(String),
}

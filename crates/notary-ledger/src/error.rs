/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The key has no live record.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// Range bounds are inverted.
    #[error("invalid range: start={start:?} is after end={end:?}")]
    InvalidRange { start: String, end: String },

    /// The host collaborator failed.
    #[error("ledger I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    pub fn not_found(key: &str) -> Self {
        Self::NotFound {
            key: key.to_string(),
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

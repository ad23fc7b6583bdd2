use notary_ledger::LedgerError;

/// Errors from typed record storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No live record of this class at the key.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// A record already occupies the key.
    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: &'static str, key: String },

    #[error("failed to encode {kind} {key}: {reason}")]
    Encode {
        kind: &'static str,
        key: String,
        reason: String,
    },

    /// Stored bytes do not match the record schema.
    #[error("failed to decode {kind} at {key}: {reason}")]
    Decode {
        kind: &'static str,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

use std::fmt;

use notary_ledger::LedgerError;
use notary_store::StoreError;
use notary_types::TypeError;

/// Coarse classification of every registry failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    DanglingIndexEntry,
    InsufficientFunds,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidArgument => "InvalidArgument",
            Self::NotFound => "NotFound",
            Self::AlreadyExists => "AlreadyExists",
            Self::DanglingIndexEntry => "DanglingIndexEntry",
            Self::InsufficientFunds => "InsufficientFunds",
            Self::Io => "IOError",
        };
        f.write_str(name)
    }
}

/// Errors produced by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: &'static str, key: String },

    /// An index lists a key with no live record of its class.
    #[error("index {index} lists {key} but no live {kind} record exists")]
    DanglingIndexEntry {
        index: String,
        kind: &'static str,
        key: String,
    },

    #[error("insufficient funds: user {user_id} has balance {balance}, cannot debit {amount}")]
    InsufficientFunds {
        user_id: String,
        balance: i64,
        amount: i64,
    },

    /// A stored record does not match its schema.
    #[error("malformed {kind} record at {key}: {reason}")]
    Malformed {
        kind: &'static str,
        key: String,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("ledger error: {0}")]
    Ledger(String),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::Malformed { .. } | Self::Config(_) => {
                ErrorKind::InvalidArgument
            }
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::DanglingIndexEntry { .. } => ErrorKind::DanglingIndexEntry,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::Ledger(_) => ErrorKind::Io,
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, key } => Self::NotFound { kind, key },
            StoreError::AlreadyExists { kind, key } => Self::AlreadyExists { kind, key },
            StoreError::Encode { kind, key, reason } | StoreError::Decode { kind, key, reason } => {
                Self::Malformed { kind, key, reason }
            }
            StoreError::Ledger(e) => e.into(),
        }
    }
}

impl From<LedgerError> for RegistryError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound { key } => Self::NotFound {
                kind: "record",
                key,
            },
            other => Self::Ledger(other.to_string()),
        }
    }
}

impl From<TypeError> for RegistryError {
    fn from(err: TypeError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

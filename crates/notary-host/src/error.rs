use notary_ledger::LedgerError;
use notary_registry::{ErrorKind, RegistryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s) ({params}), got {got}")]
    ArgumentCount {
        function: &'static str,
        params: String,
        expected: usize,
        got: usize,
    },

    #[error("{function}: argument {param} must be an integer, got {value:?}")]
    InvalidNumber {
        function: &'static str,
        param: &'static str,
        value: String,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("commit failed: {0}")]
    Commit(#[from] LedgerError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HostError {
    /// Classify into the registry's error kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownFunction(_)
            | Self::ArgumentCount { .. }
            | Self::InvalidNumber { .. }
            | Self::Config(_) => ErrorKind::InvalidArgument,
            Self::Registry(e) => e.kind(),
            Self::Commit(e) => RegistryError::from(e.clone()).kind(),
            Self::Encode(_) => ErrorKind::Io,
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_errors_are_invalid_argument() {
        let err = HostError::InvalidNumber {
            function: "TransferAsset",
            param: "amount",
            value: "ten".into(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("amount"));
        assert_eq!(HostError::UnknownFunction("x".into()).kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn registry_kind_passes_through() {
        let err: HostError = RegistryError::NotFound {
            kind: "user",
            key: "u1".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "user not found: u1");
    }

    #[test]
    fn commit_failure_is_io() {
        let err: HostError = LedgerError::Io("disk full".into()).into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}

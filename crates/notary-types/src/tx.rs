use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of one committed ledger transaction (UUID v7, time-ordered).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(uuid::Uuid);

impl TxId {
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Last 8 hex characters, for log lines. The leading characters of a
    /// v7 id are its timestamp and repeat across nearby transactions.
    pub fn short_id(&self) -> String {
        let simple = self.0.simple().to_string();
        simple[simple.len() - 8..].to_string()
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for TxId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidTxId(format!("{s}: {e}")))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.short_id())
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(TxId::new(), TxId::new());
    }

    #[test]
    fn parse_display_roundtrip() {
        let id = TxId::new();
        let parsed: TxId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<TxId>().is_err());
    }

    #[test]
    fn short_id_is_the_tail() {
        let id = TxId::from_uuid(uuid::Uuid::from_u128(0x1234_5678_9abc));
        assert_eq!(id.short_id(), "56789abc");
        assert_eq!(format!("{id:?}"), "TxId(56789abc)");
    }
}

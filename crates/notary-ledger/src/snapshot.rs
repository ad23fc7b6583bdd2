use std::collections::BTreeMap;

use notary_types::LedgerTimestamp;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::records::KeyModification;

/// Serializable dump of an [`InMemoryLedger`](crate::InMemoryLedger):
/// live records, full version history, and the commit clock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub world: BTreeMap<String, Vec<u8>>,
    pub history: BTreeMap<String, Vec<KeyModification>>,
    pub clock: LedgerTimestamp,
}

impl LedgerSnapshot {
    pub fn to_json(&self) -> LedgerResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn from_json(data: &[u8]) -> LedgerResult<Self> {
        serde_json::from_slice(data).map_err(|e| LedgerError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLedger;
    use crate::traits::KeyValueLedger;

    #[test]
    fn restored_ledger_keeps_state_history_and_clock() {
        let ledger = InMemoryLedger::new();
        ledger.put("k", b"v1").unwrap();
        ledger.put("k", b"v2").unwrap();
        ledger.put("gone", b"x").unwrap();
        ledger.delete("gone").unwrap();

        let bytes = ledger.snapshot().unwrap().to_json().unwrap();
        let restored = InMemoryLedger::from_snapshot(LedgerSnapshot::from_json(&bytes).unwrap());

        assert_eq!(restored.get("k").unwrap(), Some(b"v2".to_vec()));
        assert!(restored.get("gone").unwrap().is_none());
        assert_eq!(restored.version_count("gone").unwrap(), 2);
        assert_eq!(restored.clock().unwrap(), ledger.clock().unwrap());

        restored.put("k", b"v3").unwrap();
        assert!(restored.clock().unwrap() > ledger.clock().unwrap());
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        assert!(matches!(
            LedgerSnapshot::from_json(b"{not json"),
            Err(LedgerError::Serialization(_))
        ));
    }
}

use serde::{Deserialize, Serialize};

use crate::temporal::LedgerTimestamp;
use crate::tx::TxId;

/// One recorded version of a ledger key, decoded for clients.
///
/// Deletions appear as tombstones: `is_delete` is set and `value` is `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry<T> {
    #[serde(rename = "TxId")]
    pub tx_id: TxId,
    #[serde(rename = "Value")]
    pub value: Option<T>,
    #[serde(rename = "Timestamp")]
    pub timestamp: LedgerTimestamp,
    #[serde(rename = "IsDelete")]
    pub is_delete: bool,
}

impl<T> HistoryEntry<T> {
    pub fn live(tx_id: TxId, value: T, timestamp: LedgerTimestamp) -> Self {
        Self {
            tx_id,
            value: Some(value),
            timestamp,
            is_delete: false,
        }
    }

    pub fn tombstone(tx_id: TxId, timestamp: LedgerTimestamp) -> Self {
        Self {
            tx_id,
            value: None,
            timestamp,
            is_delete: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Asset;

    #[test]
    fn tombstone_serializes_null_value() {
        let entry: HistoryEntry<Asset> =
            HistoryEntry::tombstone(TxId::new(), LedgerTimestamp::new(10, 0));
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json["Value"].is_null());
        assert_eq!(json["IsDelete"], true);
    }

    #[test]
    fn live_entry_embeds_record() {
        let entry = HistoryEntry::live(
            TxId::new(),
            Asset::new("a1", "deed", "u1"),
            LedgerTimestamp::new(10, 0),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["Value"]["OwnerUserID"], "u1");
        assert_eq!(json["IsDelete"], false);
    }
}

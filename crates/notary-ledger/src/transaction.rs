use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use notary_types::TxId;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::records::{WriteBatch, WriteOp};
use crate::traits::{check_range, in_range, HistoryCursor, KeyValueLedger};

/// The host's transaction boundary around one invocation.
///
/// Writes are buffered and visible to later reads in the same transaction.
/// [`commit`](Transaction::commit) hands them to the base ledger as a single
/// [`WriteBatch`]; dropping the transaction without committing discards them.
/// History reads see committed versions only.
pub struct Transaction<'a, L: KeyValueLedger + ?Sized> {
    base: &'a L,
    tx_id: TxId,
    pending: RwLock<BTreeMap<String, WriteOp>>,
}

impl<'a, L: KeyValueLedger + ?Sized> Transaction<'a, L> {
    /// Open a transaction with a fresh id.
    pub fn begin(base: &'a L) -> Self {
        Self::with_tx_id(base, TxId::new())
    }

    pub fn with_tx_id(base: &'a L, tx_id: TxId) -> Self {
        Self {
            base,
            tx_id,
            pending: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn tx_id(&self) -> TxId {
        self.tx_id
    }

    /// Number of keys with a buffered write.
    pub fn pending_writes(&self) -> LedgerResult<usize> {
        Ok(self.read_pending()?.len())
    }

    /// Drain the buffered writes into a batch without applying them.
    pub fn into_batch(mut self) -> LedgerResult<WriteBatch> {
        let pending = std::mem::take(
            self.pending
                .get_mut()
                .map_err(|_| LedgerError::Io("transaction buffer poisoned".into()))?,
        );
        Ok(WriteBatch {
            tx_id: self.tx_id,
            ops: pending.into_iter().collect(),
        })
    }

    /// Apply every buffered write to the base ledger as one batch.
    pub fn commit(self) -> LedgerResult<TxId> {
        let base = self.base;
        let batch = self.into_batch()?;
        base.write_batch(&batch)?;
        debug!(tx_id = %batch.tx_id, ops = batch.len(), "transaction committed");
        Ok(batch.tx_id)
    }

    fn read_pending(&self) -> LedgerResult<RwLockReadGuard<'_, BTreeMap<String, WriteOp>>> {
        self.pending
            .read()
            .map_err(|_| LedgerError::Io("transaction buffer poisoned".into()))
    }

    fn write_pending(&self) -> LedgerResult<RwLockWriteGuard<'_, BTreeMap<String, WriteOp>>> {
        self.pending
            .write()
            .map_err(|_| LedgerError::Io("transaction buffer poisoned".into()))
    }
}

impl<L: KeyValueLedger + ?Sized> KeyValueLedger for Transaction<'_, L> {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        match self.read_pending()?.get(key) {
            Some(WriteOp::Put(value)) => return Ok(Some(value.clone())),
            Some(WriteOp::Delete) => return Ok(None),
            None => {}
        }
        self.base.get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        self.write_pending()?
            .insert(key.to_string(), WriteOp::Put(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &str) -> LedgerResult<()> {
        if self.get(key)?.is_none() {
            return Err(LedgerError::not_found(key));
        }
        let committed = self.base.exists(key)?;
        let mut pending = self.write_pending()?;
        if committed {
            pending.insert(key.to_string(), WriteOp::Delete);
        } else {
            // Created and deleted inside this transaction: nothing to commit.
            pending.remove(key);
        }
        Ok(())
    }

    fn range_scan(&self, start: &str, end: &str) -> LedgerResult<Vec<(String, Vec<u8>)>> {
        check_range(start, end)?;
        let mut merged: BTreeMap<String, Vec<u8>> =
            self.base.range_scan(start, end)?.into_iter().collect();
        for (key, op) in self.read_pending()?.iter() {
            if !in_range(key, start, end) {
                continue;
            }
            match op {
                WriteOp::Put(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                WriteOp::Delete => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    fn history(&self, key: &str) -> LedgerResult<Box<dyn HistoryCursor + '_>> {
        self.base.history(key)
    }
}

impl<L: KeyValueLedger + ?Sized> Drop for Transaction<'_, L> {
    fn drop(&mut self) {
        let discarded = self.pending.get_mut().map(|p| p.len()).unwrap_or_default();
        if discarded > 0 {
            debug!(tx_id = %self.tx_id, discarded, "transaction discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLedger;

    #[test]
    fn reads_see_own_writes() {
        let ledger = InMemoryLedger::new();
        let tx = Transaction::begin(&ledger);
        tx.put("k", b"v").unwrap();
        assert_eq!(tx.get("k").unwrap(), Some(b"v".to_vec()));
        assert!(ledger.get("k").unwrap().is_none());
    }

    #[test]
    fn commit_applies_everything_under_one_tx_id() {
        let ledger = InMemoryLedger::new();
        let tx = Transaction::begin(&ledger);
        let tx_id = tx.tx_id();
        tx.put("a", b"1").unwrap();
        tx.put("b", b"2").unwrap();
        assert_eq!(tx.commit().unwrap(), tx_id);

        assert_eq!(ledger.get("a").unwrap(), Some(b"1".to_vec()));
        let version = ledger.history("b").unwrap().next().unwrap().unwrap();
        assert_eq!(version.tx_id, tx_id);
    }

    #[test]
    fn drop_without_commit_discards() {
        let ledger = InMemoryLedger::new();
        {
            let tx = Transaction::begin(&ledger);
            tx.put("a", b"1").unwrap();
        }
        assert!(ledger.get("a").unwrap().is_none());
        assert_eq!(ledger.version_count("a").unwrap(), 0);
    }

    #[test]
    fn last_write_per_key_wins() {
        let ledger = InMemoryLedger::new();
        let tx = Transaction::begin(&ledger);
        tx.put("k", b"1").unwrap();
        tx.put("k", b"2").unwrap();
        assert_eq!(tx.pending_writes().unwrap(), 1);
        tx.commit().unwrap();
        assert_eq!(ledger.get("k").unwrap(), Some(b"2".to_vec()));
        assert_eq!(ledger.version_count("k").unwrap(), 1);
    }

    #[test]
    fn delete_of_absent_key_is_not_found() {
        let ledger = InMemoryLedger::new();
        let tx = Transaction::begin(&ledger);
        assert!(matches!(tx.delete("ghost"), Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn delete_twice_in_one_transaction_fails() {
        let ledger = InMemoryLedger::new();
        ledger.put("k", b"v").unwrap();
        let tx = Transaction::begin(&ledger);
        tx.delete("k").unwrap();
        assert!(tx.get("k").unwrap().is_none());
        assert!(matches!(tx.delete("k"), Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn create_then_delete_leaves_no_trace() {
        let ledger = InMemoryLedger::new();
        let tx = Transaction::begin(&ledger);
        tx.put("tmp", b"v").unwrap();
        tx.delete("tmp").unwrap();
        assert_eq!(tx.pending_writes().unwrap(), 0);
        tx.commit().unwrap();
        assert_eq!(ledger.version_count("tmp").unwrap(), 0);
    }

    #[test]
    fn range_scan_merges_pending_writes() {
        let ledger = InMemoryLedger::new();
        ledger.put("a", b"1").unwrap();
        ledger.put("b", b"2").unwrap();
        let tx = Transaction::begin(&ledger);
        tx.delete("a").unwrap();
        tx.put("c", b"3").unwrap();
        tx.put("z", b"9").unwrap();

        let keys: Vec<String> = tx
            .range_scan("", "d")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn history_shows_committed_versions_only() {
        let ledger = InMemoryLedger::new();
        ledger.put("k", b"v1").unwrap();
        let tx = Transaction::begin(&ledger);
        tx.put("k", b"v2").unwrap();
        assert_eq!(tx.history("k").unwrap().count(), 1);
    }

    #[test]
    fn failed_commit_applies_nothing() {
        let ledger = InMemoryLedger::new();
        ledger.put("k", b"v").unwrap();
        let tx = Transaction::begin(&ledger);
        tx.delete("k").unwrap();
        tx.put("other", b"x").unwrap();
        // Another writer removes the key before this transaction commits.
        ledger.delete("k").unwrap();
        assert!(tx.commit().is_err());
        assert!(ledger.get("other").unwrap().is_none());
    }
}

//! Fault-injecting ledger for exercising failure paths.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::memory::InMemoryLedger;
use crate::records::{KeyModification, WriteBatch, WriteOp};
use crate::traits::{HistoryCursor, KeyValueLedger};

/// How [`FaultyLedger`] applies a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchMode {
    /// Reject the whole batch up front if any op would fail.
    Atomic,
    /// Apply ops one by one and stop at the first failure.
    Sequential,
}

/// Wraps an [`InMemoryLedger`] and fails operations on chosen keys.
pub struct FaultyLedger {
    inner: InMemoryLedger,
    mode: BatchMode,
    failing_puts: RwLock<HashSet<String>>,
    failing_gets: RwLock<HashSet<String>>,
    failing_history: RwLock<Option<(String, usize)>>,
}

impl FaultyLedger {
    pub fn new(mode: BatchMode) -> Self {
        Self {
            inner: InMemoryLedger::new(),
            mode,
            failing_puts: RwLock::new(HashSet::new()),
            failing_gets: RwLock::new(HashSet::new()),
            failing_history: RwLock::new(None),
        }
    }

    pub fn inner(&self) -> &InMemoryLedger {
        &self.inner
    }

    pub fn fail_puts_on(&self, key: &str) {
        self.failing_puts
            .write()
            .expect("lock poisoned")
            .insert(key.to_string());
    }

    pub fn fail_gets_on(&self, key: &str) {
        self.failing_gets
            .write()
            .expect("lock poisoned")
            .insert(key.to_string());
    }

    /// Make the history cursor for `key` fail after yielding `after` versions.
    pub fn fail_history_on(&self, key: &str, after: usize) {
        *self.failing_history.write().expect("lock poisoned") = Some((key.to_string(), after));
    }

    pub fn clear_faults(&self) {
        self.failing_puts.write().expect("lock poisoned").clear();
        self.failing_gets.write().expect("lock poisoned").clear();
        *self.failing_history.write().expect("lock poisoned") = None;
    }

    fn put_fails(&self, key: &str) -> bool {
        self.failing_puts.read().expect("lock poisoned").contains(key)
    }

    fn injected(key: &str) -> LedgerError {
        LedgerError::Io(format!("injected failure on {key}"))
    }
}

impl KeyValueLedger for FaultyLedger {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        if self.failing_gets.read().expect("lock poisoned").contains(key) {
            return Err(Self::injected(key));
        }
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        if self.put_fails(key) {
            return Err(Self::injected(key));
        }
        self.inner.put(key, value)
    }

    fn delete(&self, key: &str) -> LedgerResult<()> {
        self.inner.delete(key)
    }

    fn range_scan(&self, start: &str, end: &str) -> LedgerResult<Vec<(String, Vec<u8>)>> {
        self.inner.range_scan(start, end)
    }

    fn history(&self, key: &str) -> LedgerResult<Box<dyn HistoryCursor + '_>> {
        let cursor = self.inner.history(key)?;
        let fail_after = self
            .failing_history
            .read()
            .expect("lock poisoned")
            .as_ref()
            .filter(|(k, _)| k == key)
            .map(|(_, after)| *after);
        match fail_after {
            Some(after) => Ok(Box::new(FailingCursor {
                inner: cursor,
                remaining: after,
                failed: false,
            })),
            None => Ok(cursor),
        }
    }

    fn write_batch(&self, batch: &WriteBatch) -> LedgerResult<()> {
        match self.mode {
            BatchMode::Atomic => {
                if let Some(key) = batch
                    .ops
                    .iter()
                    .filter(|(_, op)| matches!(op, WriteOp::Put(_)))
                    .map(|(k, _)| k)
                    .find(|k| self.put_fails(k))
                {
                    return Err(Self::injected(key));
                }
                self.inner.write_batch(batch)
            }
            BatchMode::Sequential => {
                for (key, op) in &batch.ops {
                    match op {
                        WriteOp::Put(value) => self.put(key, value)?,
                        WriteOp::Delete => self.delete(key)?,
                    }
                }
                Ok(())
            }
        }
    }
}

struct FailingCursor<'a> {
    inner: Box<dyn HistoryCursor + 'a>,
    remaining: usize,
    failed: bool,
}

impl Iterator for FailingCursor<'_> {
    type Item = LedgerResult<KeyModification>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            if self.failed {
                return None;
            }
            self.failed = true;
            return Some(Err(LedgerError::Io("injected history failure".into())));
        }
        self.remaining -= 1;
        self.inner.next()
    }
}

impl HistoryCursor for FailingCursor<'_> {
    fn close(&mut self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_types::TxId;

    #[test]
    fn atomic_mode_rejects_whole_batch() {
        let ledger = FaultyLedger::new(BatchMode::Atomic);
        ledger.fail_puts_on("b");
        let batch = WriteBatch::new(TxId::new())
            .put("a", b"1".to_vec())
            .put("b", b"2".to_vec());
        assert!(ledger.write_batch(&batch).is_err());
        assert!(ledger.get("a").unwrap().is_none());
    }

    #[test]
    fn sequential_mode_leaves_prefix_applied() {
        let ledger = FaultyLedger::new(BatchMode::Sequential);
        ledger.fail_puts_on("b");
        let batch = WriteBatch::new(TxId::new())
            .put("a", b"1".to_vec())
            .put("b", b"2".to_vec());
        assert!(ledger.write_batch(&batch).is_err());
        assert_eq!(ledger.get("a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn failing_cursor_still_releases() {
        let ledger = FaultyLedger::new(BatchMode::Atomic);
        ledger.put("k", b"v1").unwrap();
        ledger.put("k", b"v2").unwrap();
        ledger.fail_history_on("k", 1);
        {
            let mut cursor = ledger.history("k").unwrap();
            assert!(cursor.next().unwrap().is_ok());
            assert!(cursor.next().unwrap().is_err());
            assert_eq!(ledger.inner().open_cursors(), 1);
        }
        assert_eq!(ledger.inner().open_cursors(), 0);
    }
}

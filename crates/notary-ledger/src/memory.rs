use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use notary_types::{LedgerTimestamp, TxId};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::records::{KeyModification, WriteBatch, WriteOp};
use crate::snapshot::LedgerSnapshot;
use crate::traits::{check_range, HistoryCursor, KeyValueLedger};

/// In-memory host ledger for tests, local demos, and the CLI.
///
/// World state lives in a `BTreeMap` so range scans come back sorted. Every
/// committed op is appended to the key's version history. Direct `put` and
/// `delete` calls are each committed as their own single-op transaction.
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
    open_cursors: Arc<AtomicUsize>,
}

pub(crate) struct LedgerState {
    pub(crate) world: BTreeMap<String, Vec<u8>>,
    pub(crate) history: BTreeMap<String, Vec<KeyModification>>,
    pub(crate) clock: LedgerTimestamp,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            world: BTreeMap::new(),
            history: BTreeMap::new(),
            clock: LedgerTimestamp::zero(),
        }
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::from_state(LedgerState::default())
    }

    fn from_state(state: LedgerState) -> Self {
        Self {
            inner: RwLock::new(state),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Rebuild a ledger from a previously taken snapshot.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self::from_state(LedgerState {
            world: snapshot.world,
            history: snapshot.history,
            clock: snapshot.clock,
        })
    }

    /// Capture world state and history.
    pub fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        let state = self.read_state()?;
        Ok(LedgerSnapshot {
            world: state.world.clone(),
            history: state.history.clone(),
            clock: state.clock,
        })
    }

    /// Number of keys with a live record.
    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.read_state()?.world.len())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.read_state()?.world.is_empty())
    }

    /// Number of versions recorded for `key`, tombstones included.
    pub fn version_count(&self, key: &str) -> LedgerResult<usize> {
        Ok(self
            .read_state()?
            .history
            .get(key)
            .map_or(0, Vec::len))
    }

    /// Timestamp of the most recent commit.
    pub fn clock(&self) -> LedgerResult<LedgerTimestamp> {
        Ok(self.read_state()?.clock)
    }

    /// History cursors handed out and not yet closed.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    fn read_state(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Io("ledger read lock poisoned".into()))
    }

    fn write_state(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Io("ledger write lock poisoned".into()))
    }

    /// Validate then apply a batch under one lock, one tx id and one timestamp.
    fn commit(state: &mut LedgerState, batch: &WriteBatch) -> LedgerResult<()> {
        let mut deleted = HashSet::new();
        let mut written = HashSet::new();
        for (key, op) in &batch.ops {
            match op {
                WriteOp::Put(_) => {
                    deleted.remove(key.as_str());
                    written.insert(key.as_str());
                }
                WriteOp::Delete => {
                    let live = written.contains(key.as_str())
                        || (state.world.contains_key(key) && !deleted.contains(key.as_str()));
                    if !live {
                        return Err(LedgerError::not_found(key));
                    }
                    written.remove(key.as_str());
                    deleted.insert(key.as_str());
                }
            }
        }

        let timestamp = state.clock.next();
        state.clock = timestamp;

        for (key, op) in &batch.ops {
            let modification = match op {
                WriteOp::Put(value) => {
                    state.world.insert(key.clone(), value.clone());
                    KeyModification {
                        tx_id: batch.tx_id,
                        value: Some(value.clone()),
                        timestamp,
                        is_delete: false,
                    }
                }
                WriteOp::Delete => {
                    state.world.remove(key);
                    KeyModification {
                        tx_id: batch.tx_id,
                        value: None,
                        timestamp,
                        is_delete: true,
                    }
                }
            };
            state
                .history
                .entry(key.clone())
                .or_default()
                .push(modification);
        }

        debug!(tx_id = %batch.tx_id, ops = batch.len(), %timestamp, "batch committed");
        Ok(())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueLedger for InMemoryLedger {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.read_state()?.world.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        let batch = WriteBatch::new(TxId::new()).put(key, value.to_vec());
        self.write_batch(&batch)
    }

    fn delete(&self, key: &str) -> LedgerResult<()> {
        let batch = WriteBatch::new(TxId::new()).delete(key);
        self.write_batch(&batch)
    }

    fn range_scan(&self, start: &str, end: &str) -> LedgerResult<Vec<(String, Vec<u8>)>> {
        check_range(start, end)?;
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };
        let state = self.read_state()?;
        Ok(state
            .world
            .range::<str, _>((lower, upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn history(&self, key: &str) -> LedgerResult<Box<dyn HistoryCursor + '_>> {
        let versions = self
            .read_state()?
            .history
            .get(key)
            .cloned()
            .unwrap_or_default();
        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryHistoryCursor {
            versions: versions.into_iter(),
            open: Some(Arc::clone(&self.open_cursors)),
        }))
    }

    fn write_batch(&self, batch: &WriteBatch) -> LedgerResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut state = self.write_state()?;
        Self::commit(&mut state, batch)
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self.len().unwrap_or_default();
        f.debug_struct("InMemoryLedger")
            .field("live_keys", &keys)
            .field("open_cursors", &self.open_cursors())
            .finish()
    }
}

/// Cursor over a copy of one key's versions taken when it was opened.
struct MemoryHistoryCursor {
    versions: std::vec::IntoIter<KeyModification>,
    open: Option<Arc<AtomicUsize>>,
}

impl Iterator for MemoryHistoryCursor {
    type Item = LedgerResult<KeyModification>;

    fn next(&mut self) -> Option<Self::Item> {
        self.open.as_ref()?;
        self.versions.next().map(Ok)
    }
}

impl HistoryCursor for MemoryHistoryCursor {
    fn close(&mut self) {
        if let Some(counter) = self.open.take() {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MemoryHistoryCursor {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Point operations
    // -----------------------------------------------------------------------

    #[test]
    fn put_then_get() {
        let ledger = InMemoryLedger::new();
        ledger.put("k", b"v1").unwrap();
        assert_eq!(ledger.get("k").unwrap(), Some(b"v1".to_vec()));
        assert!(ledger.exists("k").unwrap());
    }

    #[test]
    fn get_missing_returns_none() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.get("nope").unwrap().is_none());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.delete("nope"), Err(LedgerError::not_found("nope")));
        assert_eq!(ledger.version_count("nope").unwrap(), 0);
    }

    #[test]
    fn delete_removes_live_record() {
        let ledger = InMemoryLedger::new();
        ledger.put("k", b"v").unwrap();
        ledger.delete("k").unwrap();
        assert!(ledger.get("k").unwrap().is_none());
        assert!(ledger.is_empty().unwrap());
    }

    // -----------------------------------------------------------------------
    // Range scan
    // -----------------------------------------------------------------------

    #[test]
    fn range_scan_is_sorted_and_half_open() {
        let ledger = InMemoryLedger::new();
        for key in ["c", "a", "d", "b"] {
            ledger.put(key, key.as_bytes()).unwrap();
        }
        let keys: Vec<String> = ledger
            .range_scan("b", "d")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn range_scan_empty_bounds_are_open() {
        let ledger = InMemoryLedger::new();
        for key in ["x", "y", "z"] {
            ledger.put(key, b"1").unwrap();
        }
        assert_eq!(ledger.range_scan("", "").unwrap().len(), 3);
        assert_eq!(ledger.range_scan("y", "").unwrap().len(), 2);
        assert_eq!(ledger.range_scan("", "y").unwrap().len(), 1);
    }

    #[test]
    fn range_scan_rejects_inverted_bounds() {
        let ledger = InMemoryLedger::new();
        assert!(matches!(
            ledger.range_scan("z", "a"),
            Err(LedgerError::InvalidRange { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    #[test]
    fn history_records_versions_and_tombstones_in_order() {
        let ledger = InMemoryLedger::new();
        ledger.put("k", b"v1").unwrap();
        ledger.put("k", b"v2").unwrap();
        ledger.delete("k").unwrap();

        let versions: Vec<KeyModification> = ledger
            .history("k")
            .unwrap()
            .collect::<LedgerResult<_>>()
            .unwrap();
        assert_eq!(versions.len(), 3);
        assert_eq!(versions[0].value.as_deref(), Some(&b"v1"[..]));
        assert_eq!(versions[1].value.as_deref(), Some(&b"v2"[..]));
        assert!(versions[2].is_delete);
        assert!(versions[2].value.is_none());
        for pair in versions.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
            assert_ne!(pair[0].tx_id, pair[1].tx_id);
        }
    }

    #[test]
    fn history_of_unknown_key_is_empty() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.history("ghost").unwrap().count(), 0);
    }

    #[test]
    fn cursor_released_on_drop() {
        let ledger = InMemoryLedger::new();
        ledger.put("k", b"v").unwrap();
        {
            let _cursor = ledger.history("k").unwrap();
            assert_eq!(ledger.open_cursors(), 1);
        }
        assert_eq!(ledger.open_cursors(), 0);
    }

    #[test]
    fn closed_cursor_yields_nothing() {
        let ledger = InMemoryLedger::new();
        ledger.put("k", b"v1").unwrap();
        ledger.put("k", b"v2").unwrap();
        let mut cursor = ledger.history("k").unwrap();
        assert!(cursor.next().is_some());
        cursor.close();
        cursor.close();
        assert_eq!(ledger.open_cursors(), 0);
        assert!(cursor.next().is_none());
    }

    // -----------------------------------------------------------------------
    // Batches
    // -----------------------------------------------------------------------

    #[test]
    fn batch_shares_tx_id_and_timestamp() {
        let ledger = InMemoryLedger::new();
        let tx = TxId::new();
        let batch = WriteBatch::new(tx)
            .put("a", b"1".to_vec())
            .put("b", b"2".to_vec());
        ledger.write_batch(&batch).unwrap();

        let a = ledger.history("a").unwrap().next().unwrap().unwrap();
        let b = ledger.history("b").unwrap().next().unwrap().unwrap();
        assert_eq!(a.tx_id, tx);
        assert_eq!(b.tx_id, tx);
        assert_eq!(a.timestamp, b.timestamp);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let ledger = InMemoryLedger::new();
        let batch = WriteBatch::new(TxId::new())
            .put("a", b"1".to_vec())
            .delete("missing");
        assert!(matches!(
            ledger.write_batch(&batch),
            Err(LedgerError::NotFound { .. })
        ));
        assert!(ledger.get("a").unwrap().is_none());
        assert_eq!(ledger.version_count("a").unwrap(), 0);
    }

    #[test]
    fn batch_may_delete_key_it_created() {
        let ledger = InMemoryLedger::new();
        let batch = WriteBatch::new(TxId::new())
            .put("a", b"1".to_vec())
            .delete("a");
        ledger.write_batch(&batch).unwrap();
        assert!(ledger.get("a").unwrap().is_none());
        assert_eq!(ledger.version_count("a").unwrap(), 2);
    }

    #[test]
    fn clock_never_decreases() {
        let ledger = InMemoryLedger::new();
        let mut last = ledger.clock().unwrap();
        for i in 0..50u8 {
            ledger.put("k", &[i]).unwrap();
            let now = ledger.clock().unwrap();
            assert!(now > last);
            last = now;
        }
    }

    // -----------------------------------------------------------------------
    // Concurrent read safety
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_reads_are_safe() {
        use std::thread;

        let ledger = Arc::new(InMemoryLedger::new());
        ledger.put("shared", b"data").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    assert_eq!(ledger.get("shared").unwrap(), Some(b"data".to_vec()));
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let ledger = InMemoryLedger::new();
        let debug = format!("{ledger:?}");
        assert!(debug.contains("InMemoryLedger"));
        assert!(debug.contains("live_keys"));
    }
}

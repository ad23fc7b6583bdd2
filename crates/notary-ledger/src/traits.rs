use crate::error::{LedgerError, LedgerResult};
use crate::records::{KeyModification, WriteBatch, WriteOp};

/// Oldest-first cursor over the recorded versions of one key.
///
/// Holds host-side resources until [`close`](HistoryCursor::close) is called
/// or the cursor is dropped. Closing twice is a no-op; a closed cursor
/// yields nothing further.
pub trait HistoryCursor: Iterator<Item = LedgerResult<KeyModification>> {
    fn close(&mut self);
}

/// The key-value ledger collaborator supplied by the host.
///
/// All implementations must satisfy these invariants:
/// - `get` returns `Ok(None)` for absent keys; `Err` only on collaborator failure.
/// - `delete` fails with [`LedgerError::NotFound`] when the key is absent.
/// - `range_scan` returns pairs sorted by key, `start` inclusive, `end`
///   exclusive. An empty `start` or `end` leaves that side unbounded.
/// - `history` yields every version of the key, oldest first, including
///   deletions as tombstones.
pub trait KeyValueLedger: Send + Sync {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()>;

    fn delete(&self, key: &str) -> LedgerResult<()>;

    fn range_scan(&self, start: &str, end: &str) -> LedgerResult<Vec<(String, Vec<u8>)>>;

    fn history(&self, key: &str) -> LedgerResult<Box<dyn HistoryCursor + '_>>;

    /// Check whether the key holds a live record.
    fn exists(&self, key: &str) -> LedgerResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Apply every op in the batch.
    ///
    /// Default implementation applies ops one at a time and stops at the
    /// first failure, leaving earlier ops applied. Backends that can commit
    /// atomically override this.
    fn write_batch(&self, batch: &WriteBatch) -> LedgerResult<()> {
        for (key, op) in &batch.ops {
            match op {
                WriteOp::Put(value) => self.put(key, value)?,
                WriteOp::Delete => self.delete(key)?,
            }
        }
        Ok(())
    }
}

/// Validate range bounds shared by every backend.
pub(crate) fn check_range(start: &str, end: &str) -> LedgerResult<()> {
    if !start.is_empty() && !end.is_empty() && start > end {
        return Err(LedgerError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}

/// Returns `true` if `key` falls in `[start, end)` with empty bounds open.
pub(crate) fn in_range(key: &str, start: &str, end: &str) -> bool {
    (start.is_empty() || key >= start) && (end.is_empty() || key < end)
}

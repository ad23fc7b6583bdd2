use std::marker::PhantomData;

use notary_ledger::KeyValueLedger;
use tracing::debug;

use crate::codec::{Record, RecordCodec};
use crate::error::{StoreError, StoreResult};

/// Create/read/update/delete for one record class.
///
/// The ledger does not enforce uniqueness, so `create` checks for an existing
/// record itself. No method takes a lock: a read-modify-write through
/// [`update`](EntityStore::update) is only safe because the host serializes
/// the surrounding invocation.
pub struct EntityStore<'l, T, L: KeyValueLedger + ?Sized> {
    ledger: &'l L,
    _record: PhantomData<fn() -> T>,
}

impl<'l, T: Record, L: KeyValueLedger + ?Sized> EntityStore<'l, T, L> {
    pub fn new(ledger: &'l L) -> Self {
        Self {
            ledger,
            _record: PhantomData,
        }
    }

    /// Store `value` under `key`, failing if a record is already there.
    pub fn create(&self, key: &str, value: &T) -> StoreResult<()> {
        if self.ledger.exists(key)? {
            return Err(StoreError::AlreadyExists {
                kind: T::KIND,
                key: key.to_string(),
            });
        }
        self.write(key, value)?;
        debug!(kind = T::KIND, key, "record created");
        Ok(())
    }

    /// Read the record at `key`.
    pub fn read(&self, key: &str) -> StoreResult<T> {
        self.find(key)?.ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            key: key.to_string(),
        })
    }

    /// Read the record at `key` if one exists.
    pub fn find(&self, key: &str) -> StoreResult<Option<T>> {
        match self.ledger.get(key)? {
            Some(bytes) => RecordCodec::decode(T::KIND, key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.ledger.exists(key)?)
    }

    /// Read, mutate, write back. Returns the stored value.
    pub fn update<F>(&self, key: &str, mutate: F) -> StoreResult<T>
    where
        F: FnOnce(&mut T),
    {
        self.try_update(key, |value| {
            mutate(value);
            Ok::<_, StoreError>(())
        })
    }

    /// Like [`update`](Self::update) with a mutator that may veto the write.
    /// Nothing is written when the mutator fails.
    pub fn try_update<F, E>(&self, key: &str, mutate: F) -> Result<T, E>
    where
        F: FnOnce(&mut T) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut value = self.read(key)?;
        mutate(&mut value)?;
        self.write(key, &value)?;
        debug!(kind = T::KIND, key, "record updated");
        Ok(value)
    }

    /// Remove the record at `key`. Indexes are not touched.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        if !self.ledger.exists(key)? {
            return Err(StoreError::NotFound {
                kind: T::KIND,
                key: key.to_string(),
            });
        }
        self.ledger.delete(key)?;
        debug!(kind = T::KIND, key, "record deleted");
        Ok(())
    }

    /// Unconditional write.
    pub fn write(&self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = RecordCodec::encode(T::KIND, key, value)?;
        self.ledger.put(key, &bytes)?;
        Ok(())
    }
}

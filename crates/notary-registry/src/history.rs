//! Typed projection of a key's version history.

use std::marker::PhantomData;

use notary_ledger::{HistoryCursor, KeyModification, KeyValueLedger};
use notary_store::RecordCodec;
use notary_types::HistoryEntry;
use serde::de::DeserializeOwned;

use crate::error::{RegistryError, RegistryResult};

/// Opens history projections over a ledger.
pub struct HistoryProjector;

impl HistoryProjector {
    /// Project every recorded version of `key`, oldest first.
    ///
    /// `kind` names the record class for decode errors.
    pub fn project<'l, T, L>(
        ledger: &'l L,
        kind: &'static str,
        key: &str,
    ) -> RegistryResult<HistoryProjection<'l, T>>
    where
        T: DeserializeOwned,
        L: KeyValueLedger + ?Sized,
    {
        let cursor = ledger.history(key)?;
        Ok(HistoryProjection {
            cursor: Some(cursor),
            kind,
            key: key.to_string(),
            _entry: PhantomData,
        })
    }
}

/// Lazy, finite, single-pass sequence of [`HistoryEntry`] values.
///
/// The underlying cursor is closed when the sequence is exhausted, when an
/// item fails, or when the projection is dropped, whichever happens first.
/// After an error the projection yields nothing further.
pub struct HistoryProjection<'l, T> {
    cursor: Option<Box<dyn HistoryCursor + 'l>>,
    kind: &'static str,
    key: String,
    _entry: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> HistoryProjection<'_, T> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the underlying cursor has been released.
    pub fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }

    fn release(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
    }

    fn decode(&self, modification: KeyModification) -> RegistryResult<HistoryEntry<T>> {
        if modification.is_delete {
            return Ok(HistoryEntry::tombstone(
                modification.tx_id,
                modification.timestamp,
            ));
        }
        let bytes = modification.value.ok_or_else(|| RegistryError::Malformed {
            kind: self.kind,
            key: self.key.clone(),
            reason: format!("version {} has neither value nor delete flag", modification.tx_id),
        })?;
        let value = RecordCodec::decode(self.kind, &self.key, &bytes)?;
        Ok(HistoryEntry::live(
            modification.tx_id,
            value,
            modification.timestamp,
        ))
    }
}

impl<T: DeserializeOwned> Iterator for HistoryProjection<'_, T> {
    type Item = RegistryResult<HistoryEntry<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.cursor.as_mut()?.next();
        let item = match step {
            None => {
                self.release();
                return None;
            }
            Some(Err(e)) => Err(e.into()),
            Some(Ok(modification)) => self.decode(modification),
        };
        if item.is_err() {
            self.release();
        }
        Some(item)
    }
}

impl<T> Drop for HistoryProjection<'_, T> {
    fn drop(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
    }
}

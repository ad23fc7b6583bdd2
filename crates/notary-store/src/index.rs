//! Ordered list of live primary keys for one record class.
//!
//! The whole list is a single ledger record under a well-known key, so every
//! append or removal is a read-modify-write of that one record. All creates
//! and deletes of a class therefore contend on the same key.

use serde::{Deserialize, Serialize};
use tracing::debug;

use notary_ledger::KeyValueLedger;

use crate::codec::RecordCodec;
use crate::error::StoreResult;

const KIND: &str = "index";

/// Stored body of an index record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct IndexRecord {
    #[serde(rename = "Keys")]
    keys: Vec<String>,
}

/// Handle on one index record.
pub struct IndexList<'l, L: KeyValueLedger + ?Sized> {
    ledger: &'l L,
    list_key: String,
}

impl<'l, L: KeyValueLedger + ?Sized> IndexList<'l, L> {
    pub fn new(ledger: &'l L, list_key: impl Into<String>) -> Self {
        Self {
            ledger,
            list_key: list_key.into(),
        }
    }

    pub fn list_key(&self) -> &str {
        &self.list_key
    }

    /// The keys in insertion order. A missing record reads as empty.
    pub fn load(&self) -> StoreResult<Vec<String>> {
        match self.ledger.get(&self.list_key)? {
            Some(bytes) => {
                let record: IndexRecord = RecordCodec::decode(KIND, &self.list_key, &bytes)?;
                Ok(record.keys)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Write an empty list if none exists. Returns `true` if one was written.
    pub fn init(&self) -> StoreResult<bool> {
        if self.ledger.exists(&self.list_key)? {
            return Ok(false);
        }
        self.persist(Vec::new())?;
        Ok(true)
    }

    /// Append `key` at the end. Duplicates are not checked.
    pub fn append(&self, key: &str) -> StoreResult<()> {
        let mut keys = self.load()?;
        keys.push(key.to_string());
        self.persist(keys)?;
        debug!(index = %self.list_key, key, "index entry appended");
        Ok(())
    }

    /// Remove the first occurrence of `key`. Returns `false`, writing
    /// nothing, when the key is not listed.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        let mut keys = self.load()?;
        let Some(pos) = keys.iter().position(|k| k == key) else {
            return Ok(false);
        };
        keys.remove(pos);
        self.persist(keys)?;
        debug!(index = %self.list_key, key, "index entry removed");
        Ok(true)
    }

    pub fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.load()?.iter().any(|k| k == key))
    }

    fn persist(&self, keys: Vec<String>) -> StoreResult<()> {
        let bytes = RecordCodec::encode(KIND, &self.list_key, &IndexRecord { keys })?;
        self.ledger.put(&self.list_key, &bytes)?;
        Ok(())
    }
}

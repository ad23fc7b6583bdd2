use serde::de::DeserializeOwned;
use serde::Serialize;

use notary_types::{Asset, User};

use crate::error::{StoreError, StoreResult};

/// A record class stored under its own primary key.
pub trait Record: Serialize + DeserializeOwned {
    /// Human-readable class name used in errors and logs.
    const KIND: &'static str;

    /// The primary key this record is stored under.
    fn key(&self) -> &str;
}

impl Record for User {
    const KIND: &'static str = "user";

    fn key(&self) -> &str {
        &self.user_id
    }
}

impl Record for Asset {
    const KIND: &'static str = "asset";

    fn key(&self) -> &str {
        &self.asset_id
    }
}

/// Stateless JSON codec for ledger values.
pub struct RecordCodec;

impl RecordCodec {
    /// Encode a record body. `key` only labels errors.
    pub fn encode<T: Serialize>(kind: &'static str, key: &str, value: &T) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| StoreError::Encode {
            kind,
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Decode a record body, rejecting missing or unknown fields.
    pub fn decode<T: DeserializeOwned>(
        kind: &'static str,
        key: &str,
        data: &[u8],
    ) -> StoreResult<T> {
        serde_json::from_slice(data).map_err(|e| StoreError::Decode {
            kind,
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn encode_record<T: Record>(record: &T) -> StoreResult<Vec<u8>> {
        Self::encode(T::KIND, record.key(), record)
    }

    pub fn decode_record<T: Record>(key: &str, data: &[u8]) -> StoreResult<T> {
        Self::decode(T::KIND, key, data)
    }
}

//! Typed record storage on top of a [`KeyValueLedger`](notary_ledger::KeyValueLedger).
//!
//! - [`RecordCodec`]: JSON encoding of record bodies with strict schemas
//! - [`EntityStore`]: create/read/update/delete for one record class
//! - [`IndexList`]: ordered list of live primary keys stored as one record
//!
//! Nothing here keeps an index in step with its records; that pairing is
//! owned by the registry layer.

pub mod codec;
pub mod entity;
pub mod error;
pub mod index;

pub use codec::{Record, RecordCodec};
pub use entity::EntityStore;
pub use error::{StoreError, StoreResult};
pub use index::IndexList;

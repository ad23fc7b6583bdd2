//! Key-value ledger boundary for the notary registry.
//!
//! The ledger itself (durability, ordering, endorsement) belongs to the host
//! platform. This crate defines the contract the registry consumes and ships
//! an in-memory host for tests, demos, and the CLI:
//!
//! - [`KeyValueLedger`]: point get/put/delete, sorted range scan, per-key
//!   history cursor, batched writes
//! - [`HistoryCursor`]: closable, oldest-first cursor over key versions
//! - [`InMemoryLedger`]: `BTreeMap` world state with full version history
//! - [`Transaction`]: buffered writes with read-your-writes, committed as
//!   one [`WriteBatch`] or discarded on drop
//! - [`LedgerSnapshot`]: serializable dump of an [`InMemoryLedger`]
//!
//! # Design Rules
//!
//! 1. A batch handed to [`KeyValueLedger::write_batch`] on the in-memory
//!    ledger applies entirely or not at all.
//! 2. Every committed op is recorded in the key's history under the batch's
//!    transaction id and one timestamp; timestamps never decrease.
//! 3. Deleting an absent key is an error, never a silent no-op.
//! 4. Cursors are released on close or drop, whichever comes first.

pub mod error;
pub mod memory;
pub mod records;
pub mod snapshot;
pub mod traits;
pub mod transaction;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{LedgerError, LedgerResult};
pub use memory::InMemoryLedger;
pub use records::{KeyModification, WriteBatch, WriteOp};
pub use snapshot::LedgerSnapshot;
pub use traits::{HistoryCursor, KeyValueLedger};
pub use transaction::Transaction;

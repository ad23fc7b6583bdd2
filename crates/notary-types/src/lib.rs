//! Foundation types for the notary registry.
//!
//! This crate provides the record schemas and identifiers shared by every
//! other notary crate. It performs no I/O.
//!
//! # Key Types
//!
//! - [`User`]: registry participant holding a balance
//! - [`Asset`]: notarized item owned by exactly one user
//! - [`UserProfile`]: read model joining a user with the assets it owns
//! - [`HistoryEntry`]: one projected version of a ledger key
//! - [`LedgerTimestamp`]: monotonic commit timestamp assigned by the ledger
//! - [`TxId`]: UUID v7 transaction identifier

pub mod entity;
pub mod error;
pub mod history;
pub mod id;
pub mod temporal;
pub mod tx;

pub use entity::{Asset, User, UserProfile};
pub use error::TypeError;
pub use history::HistoryEntry;
pub use id::{validate_entity_id, DEFAULT_ASSET_INDEX_KEY, DEFAULT_USER_INDEX_KEY};
pub use temporal::LedgerTimestamp;
pub use tx::TxId;

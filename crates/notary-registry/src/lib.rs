//! User/asset registry over a host-supplied key-value ledger.
//!
//! [`RegistryService`] keeps two primary record classes (users, assets) in
//! step with their index lists and implements the one cross-record
//! operation, [`RegistryService::transfer_asset`]. [`HistoryProjector`]
//! turns a key's version history into typed [`HistoryEntry`] values.
//!
//! # Consistency model
//!
//! Every operation reads and validates all records it needs before issuing
//! its first write. Writes made after that point are not rolled back here;
//! run the service over a [`Transaction`](notary_ledger::Transaction) so the
//! host commits or discards them together.
//!
//! [`HistoryEntry`]: notary_types::HistoryEntry

pub mod audit;
pub mod config;
pub mod error;
pub mod history;
pub mod registry;

pub use audit::{IndexAudit, RegistryAudit};
pub use config::{OverdraftPolicy, RegistryConfig, UserDeletionPolicy};
pub use error::{ErrorKind, RegistryError, RegistryResult};
pub use history::{HistoryProjection, HistoryProjector};
pub use registry::{RegistryService, TransferReceipt, UserDeletion};

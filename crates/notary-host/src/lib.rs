//! Host side of the notary registry.
//!
//! [`Host::invoke`] takes a function name and positional string arguments,
//! runs the matching registry operation inside one
//! [`Transaction`](notary_ledger::Transaction), and commits only if the
//! operation succeeded.

pub mod config;
pub mod error;
pub mod function;
pub mod host;

pub use config::HostConfig;
pub use error::{HostError, HostResult};
pub use function::Function;
pub use host::{Host, Response};

pub use notary_registry::ErrorKind;

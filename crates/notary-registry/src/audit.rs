//! Index drift report.

use serde::Serialize;

/// Drift found in one index list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IndexAudit {
    /// Ledger key of the index record.
    pub index: String,
    /// Number of entries in the list, duplicates included.
    pub listed: usize,
    /// Listed keys without a live record of the indexed class.
    pub dangling: Vec<String>,
    /// Keys listed more than once, reported once each.
    pub duplicates: Vec<String>,
}

impl IndexAudit {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.duplicates.is_empty()
    }
}

/// Drift report for both registry indexes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegistryAudit {
    pub users: IndexAudit,
    pub assets: IndexAudit,
}

impl RegistryAudit {
    pub fn is_clean(&self) -> bool {
        self.users.is_clean() && self.assets.is_clean()
    }
}

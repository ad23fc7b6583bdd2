use std::path::Path;

use notary_types::{DEFAULT_ASSET_INDEX_KEY, DEFAULT_USER_INDEX_KEY};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// What happens when a debit would take a balance below zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverdraftPolicy {
    /// Fail with `InsufficientFunds` and write nothing.
    #[default]
    Reject,
    /// Let balances go negative.
    Allow,
}

/// What happens to a user's assets when the user is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDeletionPolicy {
    /// Refuse to delete a user that still owns assets.
    #[default]
    RejectIfOwnsAssets,
    /// Delete the user's assets and retract them from the asset index.
    Cascade,
    /// Delete the user and leave its assets pointing at a missing owner.
    Orphan,
}

/// Configuration for the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub overdraft: OverdraftPolicy,
    pub user_deletion: UserDeletionPolicy,
    /// Whether a transfer requires the sender to own the asset.
    pub require_current_owner: bool,
    /// Ledger key of the user index record.
    pub user_index_key: String,
    /// Ledger key of the asset index record.
    pub asset_index_key: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            overdraft: OverdraftPolicy::Reject,
            user_deletion: UserDeletionPolicy::RejectIfOwnsAssets,
            require_current_owner: true,
            user_index_key: DEFAULT_USER_INDEX_KEY.to_string(),
            asset_index_key: DEFAULT_ASSET_INDEX_KEY.to_string(),
        }
    }
}

impl RegistryConfig {
    /// No balance floor, no ownership check, orphaning deletes.
    pub fn permissive() -> Self {
        Self {
            overdraft: OverdraftPolicy::Allow,
            user_deletion: UserDeletionPolicy::Orphan,
            require_current_owner: false,
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> RegistryResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| RegistryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> RegistryResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> RegistryResult<String> {
        toml::to_string(self).map_err(|e| RegistryError::Config(e.to_string()))
    }

    pub fn validate(&self) -> RegistryResult<()> {
        if self.user_index_key.is_empty() || self.asset_index_key.is_empty() {
            return Err(RegistryError::Config("index keys must not be empty".into()));
        }
        if self.user_index_key == self.asset_index_key {
            return Err(RegistryError::Config(format!(
                "user and asset index share the key {:?}",
                self.user_index_key
            )));
        }
        Ok(())
    }

    /// Keys no entity id may take.
    pub fn reserved_keys(&self) -> [&str; 2] {
        [self.user_index_key.as_str(), self.asset_index_key.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = RegistryConfig::default();
        assert_eq!(c.overdraft, OverdraftPolicy::Reject);
        assert_eq!(c.user_deletion, UserDeletionPolicy::RejectIfOwnsAssets);
        assert!(c.require_current_owner);
        assert_eq!(c.reserved_keys(), ["userlist", "assetlist"]);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn permissive_relaxes_every_check() {
        let c = RegistryConfig::permissive();
        assert_eq!(c.overdraft, OverdraftPolicy::Allow);
        assert_eq!(c.user_deletion, UserDeletionPolicy::Orphan);
        assert!(!c.require_current_owner);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c = RegistryConfig::from_toml_str("overdraft = \"allow\"\n").unwrap();
        assert_eq!(c.overdraft, OverdraftPolicy::Allow);
        assert_eq!(c.user_index_key, "userlist");
    }

    #[test]
    fn toml_round_trip() {
        let mut c = RegistryConfig::default();
        c.user_deletion = UserDeletionPolicy::Cascade;
        let text = c.to_toml_string().unwrap();
        assert_eq!(RegistryConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(RegistryConfig::from_toml_str("overdraught = \"allow\"\n").is_err());
    }

    #[test]
    fn shared_index_key_is_rejected() {
        let err = RegistryConfig::from_toml_str(
            "user_index_key = \"idx\"\nasset_index_key = \"idx\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "user_deletion = \"cascade\"").unwrap();
        let c = RegistryConfig::load(file.path()).unwrap();
        assert_eq!(c.user_deletion, UserDeletionPolicy::Cascade);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = RegistryConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }
}

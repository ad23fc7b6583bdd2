use std::path::Path;

use notary_registry::{RegistryConfig, RegistryError};
use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};

/// Host configuration, usually read from a TOML file.
///
/// ```toml
/// node_id = "notary-1"
///
/// [registry]
/// overdraft = "allow"
/// user_deletion = "cascade"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Identifies this host on every invocation's log span.
    pub node_id: String,
    pub registry: RegistryConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            node_id: "notary-0".to_string(),
            registry: RegistryConfig::default(),
        }
    }
}

impl HostConfig {
    pub fn from_toml_str(s: &str) -> HostResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| HostError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> HostResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| HostError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> HostResult<()> {
        if self.node_id.trim().is_empty() {
            return Err(HostError::Config("node_id must not be empty".into()));
        }
        self.registry.validate().map_err(|e| match e {
            RegistryError::Config(msg) => HostError::Config(msg),
            other => HostError::Registry(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_registry::{OverdraftPolicy, UserDeletionPolicy};
    use std::io::Write;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(HostConfig::from_toml_str("").unwrap(), HostConfig::default());
    }

    #[test]
    fn nested_registry_section() {
        let config = HostConfig::from_toml_str(
            r#"
            node_id = "n7"

            [registry]
            overdraft = "allow"
            user_deletion = "cascade"
            "#,
        )
        .unwrap();
        assert_eq!(config.node_id, "n7");
        assert_eq!(config.registry.overdraft, OverdraftPolicy::Allow);
        assert_eq!(config.registry.user_deletion, UserDeletionPolicy::Cascade);
        assert!(config.registry.require_current_owner);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(HostConfig::from_toml_str("node_id = \"\"").is_err());
        assert!(HostConfig::from_toml_str("colour = \"blue\"").is_err());
        let err = HostConfig::from_toml_str(
            "[registry]\nuser_index_key = \"same\"\nasset_index_key = \"same\"",
        )
        .unwrap_err();
        assert!(matches!(err, HostError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "node_id = \"disk\"").unwrap();
        let config = HostConfig::load(file.path()).unwrap();
        assert_eq!(config.node_id, "disk");

        let missing = file.path().with_extension("missing");
        assert!(matches!(HostConfig::load(&missing), Err(HostError::Config(_))));
    }
}

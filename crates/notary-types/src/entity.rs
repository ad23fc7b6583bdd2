//! Record schemas stored as ledger values.
//!
//! Field names on the wire match the registry's established JSON layout
//! (`UserID`, `OwnerUserID`, ...). Unknown fields are rejected at decode time
//! and every field is required, so a record of one class never decodes as a
//! zero-valued record of another.

use serde::{Deserialize, Serialize};

/// A registry participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "UserName")]
    pub user_name: String,
    #[serde(rename = "UserSurname")]
    pub user_surname: String,
    #[serde(rename = "Balance")]
    pub balance: i64,
}

impl User {
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        user_surname: impl Into<String>,
        balance: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            user_surname: user_surname.into(),
            balance,
        }
    }
}

/// A notarized asset. `owner_user_id` references a [`User`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Asset {
    #[serde(rename = "AssetID")]
    pub asset_id: String,
    #[serde(rename = "AssetType")]
    pub asset_type: String,
    #[serde(rename = "OwnerUserID")]
    pub owner_user_id: String,
}

impl Asset {
    pub fn new(
        asset_id: impl Into<String>,
        asset_type: impl Into<String>,
        owner_user_id: impl Into<String>,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            asset_type: asset_type.into(),
            owner_user_id: owner_user_id.into(),
        }
    }

    /// Returns `true` if `user_id` is the current owner.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_user_id == user_id
    }
}

/// Read-only projection of a user and every asset it owns.
///
/// Computed on demand; never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "UserName")]
    pub user_name: String,
    #[serde(rename = "UserSurname")]
    pub user_surname: String,
    #[serde(rename = "Balance")]
    pub balance: i64,
    #[serde(rename = "AssetList")]
    pub assets: Vec<Asset>,
}

impl UserProfile {
    pub fn new(user: User, assets: Vec<Asset>) -> Self {
        Self {
            user_id: user.user_id,
            user_name: user.user_name,
            user_surname: user.user_surname,
            balance: user.balance,
            assets,
        }
    }

    /// Asset ids in the order they were listed.
    pub fn asset_ids(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.asset_id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_uses_registry_field_names() {
        let user = User::new("u1", "Ada", "Lovelace", 100);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["UserID"], "u1");
        assert_eq!(json["UserSurname"], "Lovelace");
        assert_eq!(json["Balance"], 100);
    }

    #[test]
    fn asset_json_does_not_decode_as_user() {
        let asset = Asset::new("a1", "deed", "u1");
        let json = serde_json::to_vec(&asset).unwrap();
        assert!(serde_json::from_slice::<User>(&json).is_err());
    }

    #[test]
    fn missing_field_is_rejected() {
        let partial = br#"{"UserID":"u1","UserName":"Ada","UserSurname":"L"}"#;
        assert!(serde_json::from_slice::<User>(partial).is_err());
    }

    #[test]
    fn profile_carries_user_fields_and_assets() {
        let profile = UserProfile::new(
            User::new("u1", "Ada", "Lovelace", 7),
            vec![Asset::new("a1", "deed", "u1"), Asset::new("a2", "car", "u1")],
        );
        assert_eq!(profile.balance, 7);
        assert_eq!(profile.asset_ids(), vec!["a1", "a2"]);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["AssetList"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn ownership_check() {
        let asset = Asset::new("a1", "deed", "u1");
        assert!(asset.is_owned_by("u1"));
        assert!(!asset.is_owned_by("u2"));
    }
}

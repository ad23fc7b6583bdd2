//! Entity id validation.
//!
//! Primary records live under their own id in the same keyspace as the
//! index records, so an id must never equal a reserved index key.
//!
//! Valid ids:
//! - Must be non-empty
//! - Must not contain whitespace or control characters
//! - Must not equal any reserved key

use crate::error::TypeError;

/// Well-known key of the user index record.
pub const DEFAULT_USER_INDEX_KEY: &str = "userlist";

/// Well-known key of the asset index record.
pub const DEFAULT_ASSET_INDEX_KEY: &str = "assetlist";

/// Validate an entity id against the keyspace rules.
///
/// # Examples
///
/// ```
/// use notary_types::validate_entity_id;
///
/// assert!(validate_entity_id("user-1", &["userlist"]).is_ok());
/// assert!(validate_entity_id("userlist", &["userlist"]).is_err());
/// assert!(validate_entity_id("", &[]).is_err());
/// ```
pub fn validate_entity_id(id: &str, reserved: &[&str]) -> Result<(), TypeError> {
    if id.is_empty() {
        return Err(invalid(id, "id must not be empty"));
    }

    if let Some(ch) = id.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(id, &format!("contains forbidden character: {ch:?}")));
    }

    if reserved.contains(&id) {
        return Err(invalid(id, "collides with a reserved index key"));
    }

    Ok(())
}

fn invalid(id: &str, reason: &str) -> TypeError {
    TypeError::InvalidId {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESERVED: &[&str] = &[DEFAULT_USER_INDEX_KEY, DEFAULT_ASSET_INDEX_KEY];

    #[test]
    fn plain_ids_are_valid() {
        for id in ["u1", "ALICE", "asset:42", "car/7", "ü-ñ"] {
            assert!(validate_entity_id(id, RESERVED).is_ok(), "{id}");
        }
    }

    #[test]
    fn reserved_keys_are_rejected() {
        assert!(validate_entity_id("userlist", RESERVED).is_err());
        assert!(validate_entity_id("assetlist", RESERVED).is_err());
    }

    #[test]
    fn whitespace_and_control_are_rejected() {
        assert!(validate_entity_id("a b", RESERVED).is_err());
        assert!(validate_entity_id("a\tb", RESERVED).is_err());
        assert!(validate_entity_id("a\u{0}", RESERVED).is_err());
    }

    #[test]
    fn error_names_the_id() {
        let err = validate_entity_id("", RESERVED).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    proptest::proptest! {
        #[test]
        fn printable_ids_without_spaces_are_valid(id in "[A-Za-z0-9:/_-]{1,32}") {
            proptest::prop_assume!(!RESERVED.contains(&id.as_str()));
            proptest::prop_assert!(validate_entity_id(&id, RESERVED).is_ok());
        }
    }
}

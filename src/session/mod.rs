//! Per-conversation session state.
//!
//! The hosting session owns a loose key-value store. The gate and the rate
//! limiter only read and write the keys defined here; they never manage the
//! store's lifetime.

mod identity;

pub use identity::{IdentityDirectory, IdentityKind, IdentityProfile, MockIdentityDirectory};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// JSON-serialized identity record bound at session start.
pub const IDENTITY_PROFILE: &str = "identity_profile";
/// Start of the current rate-limit window (seconds since the Unix epoch).
pub const RATE_TIMER_START: &str = "rate_timer_start";
/// Model requests counted in the current window.
pub const RATE_REQUEST_COUNT: &str = "rate_request_count";
/// Discounts applied to the cart after an approval.
pub const APPLIED_DISCOUNTS: &str = "applied_discounts";

/// Mutable key-value mapping owned by the hosting session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    values: HashMap<String, Value>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse the bound identity profile, if one is present and well formed.
    pub fn identity_profile(&self) -> Option<IdentityProfile> {
        self.get_str(IDENTITY_PROFILE)
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// Bind a profile to this session, serialized as JSON.
    pub fn bind_profile(&mut self, profile: &IdentityProfile) -> crate::error::Result<()> {
        let raw = serde_json::to_string_pretty(profile)?;
        self.insert(IDENTITY_PROFILE, raw);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_read_back() {
        let mut state = SessionState::new();
        assert!(state.is_empty());

        state.insert("user:name", "Ana");
        state.insert(RATE_REQUEST_COUNT, 3);

        assert_eq!(state.get_str("user:name"), Some("Ana"));
        assert_eq!(state.get(RATE_REQUEST_COUNT), Some(&json!(3)));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_bound_profile_is_stored_as_json_text() {
        let mut state = SessionState::new();
        let profile = IdentityProfile::new("77", "João");
        state.bind_profile(&profile).unwrap();

        assert!(state.get(IDENTITY_PROFILE).unwrap().is_string());
        assert_eq!(state.identity_profile().unwrap().id, "77");
    }

    #[test]
    fn test_corrupt_profile_is_not_parsed() {
        let mut state = SessionState::new();
        state.insert(IDENTITY_PROFILE, "{not json");
        assert!(state.identity_profile().is_none());
    }
}

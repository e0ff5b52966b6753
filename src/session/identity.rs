//! Identity profiles and the lookup service that produces them.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Which kind of identity a session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Customer,
    Student,
}

impl IdentityKind {
    /// Tool argument that carries this identity.
    pub fn arg_key(&self) -> &'static str {
        match self {
            IdentityKind::Customer => "customer_id",
            IdentityKind::Student => "student_id",
        }
    }

    /// Lower-case noun used in user-facing messages.
    pub fn noun(&self) -> &'static str {
        match self {
            IdentityKind::Customer => "customer",
            IdentityKind::Student => "student",
        }
    }

    /// Capitalized noun for sentence starts.
    pub fn title(&self) -> &'static str {
        match self {
            IdentityKind::Customer => "Customer",
            IdentityKind::Student => "Student",
        }
    }
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.noun())
    }
}

/// The record binding a session to one customer or student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub id: String,
    pub name: String,
    /// Everything else the identity service knows (grade, email, cart...).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl IdentityProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// External identity lookup consulted once at session start.
pub trait IdentityDirectory: Send + Sync {
    fn lookup(&self, kind: IdentityKind, id: &str) -> Result<IdentityProfile>;
}

/// Fixed profiles standing in for the customer and student services.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityDirectory;

impl IdentityDirectory for MockIdentityDirectory {
    fn lookup(&self, kind: IdentityKind, id: &str) -> Result<IdentityProfile> {
        let profile = match kind {
            IdentityKind::Customer => IdentityProfile::new(id, "Alex Johnson")
                .with_attribute("email", "alex.johnson@example.com")
                .with_attribute("phone_number", "+1-702-555-1212")
                .with_attribute("loyalty_points", 133)
                .with_attribute("preferred_store", "Mojave Garden Center")
                .with_attribute(
                    "cart",
                    json!({
                        "items": [
                            {"product_id": "soil-123", "name": "Standard Potting Soil", "quantity": 1},
                            {"product_id": "fert-456", "name": "General Purpose Fertilizer", "quantity": 1}
                        ],
                        "subtotal": 25.98
                    }),
                ),
            IdentityKind::Student => {
                IdentityProfile::new(id, "João").with_attribute("grade", "5º ano")
            }
        };
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_lookup_keeps_requested_id() {
        let profile = MockIdentityDirectory
            .lookup(IdentityKind::Student, "42")
            .unwrap();
        assert_eq!(profile.id, "42");
        assert!(!profile.name.is_empty());
        assert_eq!(profile.attribute_str("grade"), Some("5º ano"));
    }

    #[test]
    fn test_profile_json_flattens_attributes() {
        let profile = IdentityProfile::new("42", "João").with_attribute("grade", "5º ano");
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["id"], "42");
        assert_eq!(value["grade"], "5º ano");

        let parsed: IdentityProfile = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_arg_keys() {
        assert_eq!(IdentityKind::Customer.arg_key(), "customer_id");
        assert_eq!(IdentityKind::Student.arg_key(), "student_id");
    }
}

//! Validation of identity arguments against the session-bound profile.
//!
//! We don't rely on the model picking the right customer or student id: any
//! tool call carrying one is checked against the profile bound at session
//! start.

use crate::session::{IdentityKind, IdentityProfile, SessionState, IDENTITY_PROFILE};
use serde_json::Value;
use thiserror::Error;

/// Why an identity argument was refused. The `Display` text is what the
/// model sees in place of the tool result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityRejection {
    #[error("No {noun} profile selected. Please select a profile.", noun = .kind.noun())]
    MissingProfile { kind: IdentityKind },

    #[error(
        "You cannot use the tool with {key} {attempted}, only for {bound}.",
        key = .kind.arg_key()
    )]
    IdentityMismatch {
        kind: IdentityKind,
        attempted: String,
        bound: String,
    },

    #[error(
        "{title} profile couldn't be parsed. Please reload the {noun} data.",
        title = .kind.title(),
        noun = .kind.noun()
    )]
    ProfileCorrupt { kind: IdentityKind },
}

/// Check a supplied identity argument against the bound profile.
///
/// Tool arguments are lower-cased before they get here, so the bound id is
/// compared in lower case too.
pub fn validate_identity(
    kind: IdentityKind,
    supplied: &Value,
    state: &SessionState,
) -> Result<(), IdentityRejection> {
    let raw = match state.get(IDENTITY_PROFILE) {
        Some(raw) => raw,
        None => return Err(IdentityRejection::MissingProfile { kind }),
    };

    let profile: IdentityProfile = raw
        .as_str()
        .and_then(|text| serde_json::from_str(text).ok())
        .ok_or(IdentityRejection::ProfileCorrupt { kind })?;

    let attempted = match supplied {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if attempted == profile.id || attempted == profile.id.to_lowercase() {
        Ok(())
    } else {
        Err(IdentityRejection::IdentityMismatch {
            kind,
            attempted,
            bound: profile.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_for(id: &str) -> SessionState {
        let mut state = SessionState::new();
        state
            .bind_profile(&IdentityProfile::new(id, "João").with_attribute("grade", "5º ano"))
            .unwrap();
        state
    }

    #[test]
    fn test_matching_id_passes() {
        let state = state_for("55");
        assert_eq!(validate_identity(IdentityKind::Student, &json!("55"), &state), Ok(()));
    }

    #[test]
    fn test_mismatch_names_both_ids() {
        let state = state_for("55");
        let err = validate_identity(IdentityKind::Student, &json!("99"), &state).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("99"));
        assert!(message.contains("55"));
        assert_eq!(message, "You cannot use the tool with student_id 99, only for 55.");
    }

    #[test]
    fn test_missing_profile_always_rejects() {
        let state = SessionState::new();
        for supplied in [json!("55"), json!(""), json!(55)] {
            let err = validate_identity(IdentityKind::Customer, &supplied, &state).unwrap_err();
            assert_eq!(err, IdentityRejection::MissingProfile { kind: IdentityKind::Customer });
            assert_eq!(err.to_string(), "No customer profile selected. Please select a profile.");
        }
    }

    #[test]
    fn test_corrupt_profile_asks_for_reload() {
        let mut state = SessionState::new();
        state.insert(IDENTITY_PROFILE, "{\"name\": 3");
        let err = validate_identity(IdentityKind::Customer, &json!("123"), &state).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Customer profile couldn't be parsed. Please reload the customer data."
        );

        state.insert(IDENTITY_PROFILE, json!({"id": "123"}));
        assert!(matches!(
            validate_identity(IdentityKind::Customer, &json!("123"), &state),
            Err(IdentityRejection::ProfileCorrupt { .. })
        ));
    }

    #[test]
    fn test_numeric_id_argument_is_compared_as_text() {
        let state = state_for("123");
        assert_eq!(validate_identity(IdentityKind::Customer, &json!(123), &state), Ok(()));
    }

    #[test]
    fn test_mixed_case_bound_id_accepts_lowercased_argument() {
        let state = state_for("ABC-9");
        assert_eq!(validate_identity(IdentityKind::Customer, &json!("abc-9"), &state), Ok(()));
    }
}

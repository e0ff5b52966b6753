//! A conversation: persona, session state, and message history.

use super::Persona;
use crate::config::{InstructionContext, SessionSettings};
use crate::error::Result;
use crate::llm::{Message, Role};
use crate::session::{IdentityDirectory, SessionState, IDENTITY_PROFILE};
use tracing::{debug, info};
use uuid::Uuid;

/// One conversation with one persona.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub persona: Persona,
    pub state: SessionState,
    pub history: Vec<Message>,
}

impl Session {
    /// Empty session with no profile bound.
    pub fn new(persona: Persona) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            persona,
            state: SessionState::new(),
            history: Vec::new(),
        }
    }

    /// New session with its identity profile bound.
    pub fn bootstrap(
        persona: Persona,
        directory: &dyn IdentityDirectory,
        requested_id: Option<&str>,
        settings: &SessionSettings,
    ) -> Result<Self> {
        let mut session = Self::new(persona);
        session.ensure_profile(directory, requested_id, settings)?;
        Ok(session)
    }

    /// Look up and bind a profile unless one is already bound.
    ///
    /// Returns whether a profile was bound by this call.
    pub fn ensure_profile(
        &mut self,
        directory: &dyn IdentityDirectory,
        requested_id: Option<&str>,
        settings: &SessionSettings,
    ) -> Result<bool> {
        if self.state.contains_key(IDENTITY_PROFILE) {
            debug!(session = %self.id, "Identity profile already bound");
            return Ok(false);
        }

        let id = requested_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| self.persona.default_profile_id(settings));
        let kind = self.persona.identity_kind();
        let profile = directory.lookup(kind, id)?;
        self.state.bind_profile(&profile)?;

        info!(session = %self.id, %kind, id = %profile.id, "Bound identity profile");
        Ok(true)
    }

    /// Snapshot of what the persona instruction needs.
    pub fn instruction_context(&self) -> InstructionContext {
        let mut ctx = InstructionContext::new(self.persona);
        if let Some(profile) = self.state.identity_profile() {
            ctx.user_name = Some(profile.name.clone());
            ctx.grade = profile.attribute_str("grade").map(str::to_string);
        }
        ctx.profile = self.state.get_str(IDENTITY_PROFILE).map(str::to_string);
        ctx
    }

    /// True until the user has sent a message.
    pub fn is_first_interaction(&self) -> bool {
        !self.history.iter().any(|m| m.role == Role::User)
    }

    /// Forget the conversation but keep the bound profile and rate window.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{IdentityKind, IdentityProfile, MockIdentityDirectory};

    #[test]
    fn test_bootstrap_uses_default_id() {
        let settings = SessionSettings::default();
        let session =
            Session::bootstrap(Persona::CustomerService, &MockIdentityDirectory, None, &settings)
                .unwrap();

        let profile = session.state.identity_profile().unwrap();
        assert_eq!(profile.id, "123");
        assert!(session.is_first_interaction());
    }

    #[test]
    fn test_bootstrap_uses_requested_id() {
        let settings = SessionSettings::default();
        let session =
            Session::bootstrap(Persona::Professor, &MockIdentityDirectory, Some("77"), &settings)
                .unwrap();

        let ctx = session.instruction_context();
        assert_eq!(ctx.user_name.as_deref(), Some("João"));
        assert_eq!(ctx.grade.as_deref(), Some("5º ano"));
        assert!(ctx.profile.unwrap().contains("\"77\""));
    }

    #[test]
    fn test_existing_profile_is_never_overwritten() {
        let settings = SessionSettings::default();
        let mut session = Session::new(Persona::Professor);
        session
            .state
            .bind_profile(&IdentityProfile::new("77", "Maria"))
            .unwrap();

        let bound = session
            .ensure_profile(&MockIdentityDirectory, Some("99"), &settings)
            .unwrap();
        assert!(!bound);
        assert_eq!(session.state.identity_profile().unwrap().name, "Maria");
    }

    #[test]
    fn test_clear_history_keeps_state() {
        let settings = SessionSettings::default();
        let mut session =
            Session::bootstrap(Persona::Professor, &MockIdentityDirectory, None, &settings).unwrap();
        session.history.push(Message::user("oi"));
        assert!(!session.is_first_interaction());

        session.clear_history();
        assert!(session.is_first_interaction());
        assert!(session.state.identity_profile().is_some());
        assert_eq!(
            session.persona.identity_kind(),
            IdentityKind::Student
        );
    }
}

//! The two agent personas and what each one is wired with.

use crate::config::{DiscountSettings, SessionSettings};
use crate::error::AtendeError;
use crate::gate::{Gate, ToolRules};
use crate::session::IdentityKind;
use crate::tools::{customer_service_tools, professor_tools, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which assistant a session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    /// Garden-center customer service.
    CustomerService,
    /// Virtual professor for school homework.
    Professor,
}

impl Persona {
    pub const ALL: [Persona; 2] = [Persona::CustomerService, Persona::Professor];

    /// Identity a session of this persona is bound to.
    pub fn identity_kind(&self) -> IdentityKind {
        match self {
            Persona::CustomerService => IdentityKind::Customer,
            Persona::Professor => IdentityKind::Student,
        }
    }

    /// Tools advertised to the model.
    pub fn tools(&self) -> ToolRegistry {
        match self {
            Persona::CustomerService => customer_service_tools(),
            Persona::Professor => professor_tools(),
        }
    }

    /// Tool-specific gate rules.
    pub fn rules(&self, discounts: &DiscountSettings) -> ToolRules {
        match self {
            Persona::CustomerService => ToolRules::customer_service(discounts),
            Persona::Professor => ToolRules::new(),
        }
    }

    pub fn gate(&self, discounts: &DiscountSettings) -> Gate {
        Gate::new(self.identity_kind(), self.rules(discounts))
    }

    /// Profile bound when the caller doesn't ask for one.
    pub fn default_profile_id<'a>(&self, settings: &'a SessionSettings) -> &'a str {
        match self {
            Persona::CustomerService => &settings.default_customer_id,
            Persona::Professor => &settings.default_student_id,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Persona::CustomerService => "Customer Service",
            Persona::Professor => "Professor Virtual",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Persona::CustomerService => write!(f, "customer"),
            Persona::Professor => write!(f, "professor"),
        }
    }
}

impl FromStr for Persona {
    type Err = AtendeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "customer" | "customer_service" => Ok(Persona::CustomerService),
            "professor" | "teacher" => Ok(Persona::Professor),
            other => Err(AtendeError::InvalidInput(format!(
                "unknown persona '{}' (expected 'customer' or 'professor')",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_persona() {
        assert_eq!("customer".parse::<Persona>().unwrap(), Persona::CustomerService);
        assert_eq!("Customer-Service".parse::<Persona>().unwrap(), Persona::CustomerService);
        assert_eq!("professor".parse::<Persona>().unwrap(), Persona::Professor);
        assert!("pirate".parse::<Persona>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for persona in Persona::ALL {
            assert_eq!(persona.to_string().parse::<Persona>().unwrap(), persona);
        }
    }

    #[test]
    fn test_wiring() {
        let discounts = DiscountSettings::default();
        assert_eq!(Persona::CustomerService.identity_kind().arg_key(), "customer_id");
        assert_eq!(Persona::Professor.identity_kind().arg_key(), "student_id");
        assert_eq!(Persona::CustomerService.rules(&discounts).len(), 3);
        assert!(Persona::Professor.rules(&discounts).is_empty());
        assert!(Persona::Professor.tools().get("analyze_visual_need").is_some());

        let settings = SessionSettings::default();
        assert_eq!(Persona::CustomerService.default_profile_id(&settings), "123");
        assert_eq!(Persona::Professor.default_profile_id(&settings), "default_student");
    }
}

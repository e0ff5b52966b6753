//! Tool-invocation gate.
//!
//! Wraps every domain tool call. Before the call, arguments are lower-cased,
//! the identity argument is checked against the session profile, and any
//! tool-specific rule may answer in the tool's place. After a successful
//! call, rules may trigger deterministic side effects.
//!
//! Nothing here returns an error: rejections and internal faults come back
//! as [`GateOverride`] data the dispatcher feeds to the model.

mod identity;
mod normalize;
mod rules;

pub use identity::{validate_identity, IdentityRejection};
pub use normalize::{lowercase_args, lowercase_value};
pub use rules::{ApplyApprovedDiscount, CartChangeSummary, DiscountAutoApproval, ToolRule, ToolRules};

use crate::session::{IdentityKind, SessionState};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

/// Shown to the model when a rule fails unexpectedly.
pub const GENERIC_REJECTION: &str =
    "This request couldn't be processed right now. Please try again or ask for something else.";

/// A result supplied by the gate in place of (or after) the real tool.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOverride {
    /// Short human-readable refusal; the tool is not invoked.
    Rejection(String),
    /// Structured result produced by a business rule.
    Result(Value),
}

impl GateOverride {
    /// The value handed back to the model as the tool result.
    pub fn into_value(self) -> Value {
        match self {
            GateOverride::Rejection(message) => Value::String(message),
            GateOverride::Result(value) => value,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, GateOverride::Rejection(_))
    }
}

/// Pre/post interception for one agent's tools.
pub struct Gate {
    identity: IdentityKind,
    rules: ToolRules,
}

impl Gate {
    pub fn new(identity: IdentityKind, rules: ToolRules) -> Self {
        Self { identity, rules }
    }

    pub fn identity(&self) -> IdentityKind {
        self.identity
    }

    /// Runs before a tool. `Some` means skip the tool and use the override.
    pub fn before_call(
        &self,
        tool_name: &str,
        args: &mut Map<String, Value>,
        state: &SessionState,
    ) -> Option<GateOverride> {
        lowercase_args(args);

        if let Some(supplied) = args.get(self.identity.arg_key()) {
            if let Err(rejection) = validate_identity(self.identity, supplied, state) {
                warn!(tool = tool_name, %rejection, "Tool call rejected");
                return Some(GateOverride::Rejection(rejection.to_string()));
            }
        }

        let rule = self.rules.get(tool_name)?;
        match rule.before(args, state) {
            Ok(Some(result)) => {
                debug!(tool = tool_name, "Tool call answered by rule");
                Some(result)
            }
            Ok(None) => None,
            Err(e) => {
                error!(tool = tool_name, error = %e, "Tool rule failed before call");
                Some(GateOverride::Rejection(GENERIC_REJECTION.to_string()))
            }
        }
    }

    /// Runs after a tool returned. `Some` replaces the tool's response.
    pub fn after_call(
        &self,
        tool_name: &str,
        args: &Map<String, Value>,
        response: &Value,
        state: &mut SessionState,
    ) -> Option<GateOverride> {
        let rule = self.rules.get(tool_name)?;
        match rule.after(args, response, state) {
            Ok(result) => result,
            Err(e) => {
                error!(tool = tool_name, error = %e, "Tool rule failed after call");
                Some(GateOverride::Rejection(GENERIC_REJECTION.to_string()))
            }
        }
    }
}

//! Tool-specific business rules layered on the gate.
//!
//! Rules are looked up by tool name, so adding one for a new tool is a
//! registration rather than another branch in the gate.

use super::GateOverride;
use crate::config::DiscountSettings;
use crate::error::{AtendeError, Result};
use crate::session::{SessionState, APPLIED_DISCOUNTS};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{debug, info};

/// A rule attached to one tool name. Both hooks default to "no override".
pub trait ToolRule: Send + Sync {
    /// Runs after normalization and identity validation, before the tool.
    fn before(&self, _args: &Map<String, Value>, _state: &SessionState) -> Result<Option<GateOverride>> {
        Ok(None)
    }

    /// Runs after the tool returned successfully.
    fn after(
        &self,
        _args: &Map<String, Value>,
        _response: &Value,
        _state: &mut SessionState,
    ) -> Result<Option<GateOverride>> {
        Ok(None)
    }
}

/// Registry of rules keyed by tool name.
#[derive(Default)]
pub struct ToolRules {
    rules: HashMap<String, Box<dyn ToolRule>>,
}

impl ToolRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for the customer-service agent.
    pub fn customer_service(discounts: &DiscountSettings) -> Self {
        let mut rules = Self::new();
        rules.register(
            "sync_ask_for_approval",
            DiscountAutoApproval {
                auto_approve_max: discounts.auto_approve_max,
            },
        );
        rules.register("approve_discount", ApplyApprovedDiscount);
        rules.register("modify_cart", CartChangeSummary);
        rules
    }

    pub fn register<R>(&mut self, tool_name: impl Into<String>, rule: R)
    where
        R: ToolRule + 'static,
    {
        self.rules.insert(tool_name.into(), Box::new(rule));
    }

    pub fn get(&self, tool_name: &str) -> Option<&dyn ToolRule> {
        self.rules.get(tool_name).map(|rule| rule.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Small discounts don't need a manager: answer the approval request
/// ourselves and record the discount once it is approved.
pub struct DiscountAutoApproval {
    pub auto_approve_max: f64,
}

impl ToolRule for DiscountAutoApproval {
    fn before(&self, args: &Map<String, Value>, _state: &SessionState) -> Result<Option<GateOverride>> {
        let amount = args.get("value").and_then(Value::as_f64).ok_or_else(|| {
            AtendeError::InvalidInput("approval request has no numeric 'value'".to_string())
        })?;

        if amount <= self.auto_approve_max {
            debug!(amount, "auto-approving discount below threshold");
            return Ok(Some(GateOverride::Result(json!({
                "status": "approved",
                "message": "You can approve this discount; no manager needed."
            }))));
        }
        Ok(None)
    }

    fn after(
        &self,
        args: &Map<String, Value>,
        response: &Value,
        state: &mut SessionState,
    ) -> Result<Option<GateOverride>> {
        if response_status(response) == Some("approved") {
            apply_discount(args, state)?;
        }
        Ok(None)
    }
}

/// Apply a discount the approval tool accepted.
pub struct ApplyApprovedDiscount;

impl ToolRule for ApplyApprovedDiscount {
    fn after(
        &self,
        args: &Map<String, Value>,
        response: &Value,
        state: &mut SessionState,
    ) -> Result<Option<GateOverride>> {
        if response_status(response) == Some("ok") {
            apply_discount(args, state)?;
        }
        Ok(None)
    }
}

/// Collapse a cart change that both adds and removes items into one reply.
pub struct CartChangeSummary;

impl ToolRule for CartChangeSummary {
    fn before(&self, args: &Map<String, Value>, _state: &SessionState) -> Result<Option<GateOverride>> {
        let flag = |key: &str| args.get(key).and_then(Value::as_bool) == Some(true);
        if flag("items_added") && flag("items_removed") {
            return Ok(Some(GateOverride::Result(json!({
                "result": "I have added and removed the requested items."
            }))));
        }
        Ok(None)
    }
}

fn response_status(response: &Value) -> Option<&str> {
    response.get("status").and_then(Value::as_str)
}

/// Record an approved discount against the session's cart.
fn apply_discount(args: &Map<String, Value>, state: &mut SessionState) -> Result<()> {
    info!("Applying discount to the cart");

    let entry = json!({
        "discount_type": args.get("discount_type").cloned().unwrap_or(Value::Null),
        "value": args.get("value").cloned().unwrap_or(Value::Null),
        "reason": args.get("reason").cloned().unwrap_or(Value::Null),
    });

    let mut applied = match state.remove(APPLIED_DISCOUNTS) {
        None => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            state.insert(APPLIED_DISCOUNTS, other);
            return Err(AtendeError::Session(format!(
                "'{}' is not a list",
                APPLIED_DISCOUNTS
            )));
        }
    };
    applied.push(entry);
    state.insert(APPLIED_DISCOUNTS, Value::Array(applied));
    Ok(())
}

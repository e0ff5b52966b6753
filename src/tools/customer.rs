//! Garden-center customer service tools.
//!
//! These stand in for the store's cart, catalog, scheduling and CRM systems
//! and answer with fixed data.

use super::{optional_str, required_f64, required_i64, required_str, Tool, ToolContext, ToolRegistry};
use crate::error::{AtendeError, Result};
use async_trait::async_trait;
use chrono::{Duration, Local};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

/// All customer service tools.
pub fn customer_service_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(AccessCartInformation);
    registry.register(ModifyCart);
    registry.register(GetProductRecommendations);
    registry.register(CheckProductAvailability);
    registry.register(SchedulePlantingService);
    registry.register(GetAvailablePlantingTimes);
    registry.register(SendCareInstructions);
    registry.register(GenerateQrCode);
    registry.register(ApproveDiscount);
    registry.register(SyncAskForApproval);
    registry.register(UpdateSalesforceCrm);
    registry.register(SendCallCompanionLink);
    registry
}

fn customer_id_schema() -> Value {
    json!({"type": "string", "description": "The ID of the customer."})
}

pub struct AccessCartInformation;

#[async_trait]
impl Tool for AccessCartInformation {
    fn name(&self) -> &'static str {
        "access_cart_information"
    }

    fn description(&self) -> &'static str {
        "Retrieve the current contents of the customer's shopping cart."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"customer_id": customer_id_schema()},
            "required": ["customer_id"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, _ctx: &ToolContext) -> Result<Value> {
        let customer_id = required_str(args, "customer_id")?;
        info!("Accessing cart information for customer ID: {}", customer_id);

        Ok(json!({
            "items": [
                {"product_id": "soil-123", "name": "Standard Potting Soil", "quantity": 1},
                {"product_id": "fert-456", "name": "General Purpose Fertilizer", "quantity": 1}
            ],
            "subtotal": 25.98
        }))
    }
}

pub struct ModifyCart;

#[async_trait]
impl Tool for ModifyCart {
    fn name(&self) -> &'static str {
        "modify_cart"
    }

    fn description(&self) -> &'static str {
        "Modify the customer's shopping cart by adding and/or removing items."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": customer_id_schema(),
                "items_to_add": {
                    "type": "array",
                    "description": "Items to add, each with 'product_id' and 'quantity'.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "product_id": {"type": "string"},
                            "quantity": {"type": "integer"}
                        }
                    }
                },
                "items_to_remove": {
                    "type": "array",
                    "description": "Product IDs to remove.",
                    "items": {"type": "string"}
                }
            },
            "required": ["customer_id", "items_to_add", "items_to_remove"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, _ctx: &ToolContext) -> Result<Value> {
        let customer_id = required_str(args, "customer_id")?;
        let empty = Value::Array(Vec::new());
        let to_add = args.get("items_to_add").unwrap_or(&empty);
        let to_remove = args.get("items_to_remove").unwrap_or(&empty);

        info!("Modifying cart for customer ID: {}", customer_id);
        info!("Adding items: {}", to_add);
        info!("Removing items: {}", to_remove);

        let count = |v: &Value| v.as_array().map_or(0, Vec::len);
        Ok(json!({
            "status": "success",
            "message": "Cart updated successfully.",
            "items_added": count(to_add) > 0,
            "items_removed": count(to_remove) > 0
        }))
    }
}

pub struct GetProductRecommendations;

#[async_trait]
impl Tool for GetProductRecommendations {
    fn name(&self) -> &'static str {
        "get_product_recommendations"
    }

    fn description(&self) -> &'static str {
        "Recommend products for a type of plant."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "plant_type": {"type": "string", "description": "The type of plant, e.g. 'Petunias'."},
                "customer_id": customer_id_schema()
            },
            "required": ["plant_type", "customer_id"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, _ctx: &ToolContext) -> Result<Value> {
        let plant_type = required_str(args, "plant_type")?;
        let customer_id = optional_str(args, "customer_id").unwrap_or_default();
        info!(
            "Getting product recommendations for plant type: {} and customer {}",
            plant_type, customer_id
        );

        let recommendations = if plant_type.eq_ignore_ascii_case("petunias") {
            json!([
                {
                    "product_id": "soil-456",
                    "name": "Bloom Booster Potting Mix",
                    "description": "Provides extra nutrients that Petunias love."
                },
                {
                    "product_id": "fert-789",
                    "name": "Flower Power Fertilizer",
                    "description": "Specifically formulated for flowering annuals."
                }
            ])
        } else {
            json!([
                {
                    "product_id": "soil-123",
                    "name": "Standard Potting Soil",
                    "description": "A good all-purpose potting soil."
                },
                {
                    "product_id": "fert-456",
                    "name": "General Purpose Fertilizer",
                    "description": "Suitable for a wide variety of plants."
                }
            ])
        };

        Ok(json!({"recommendations": recommendations}))
    }
}

pub struct CheckProductAvailability;

#[async_trait]
impl Tool for CheckProductAvailability {
    fn name(&self) -> &'static str {
        "check_product_availability"
    }

    fn description(&self) -> &'static str {
        "Check whether a product is available at a store, or for pickup."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "product_id": {"type": "string"},
                "store_id": {"type": "string", "description": "Store ID, or 'pickup'."}
            },
            "required": ["product_id", "store_id"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, _ctx: &ToolContext) -> Result<Value> {
        let product_id = required_str(args, "product_id")?;
        let store_id = required_str(args, "store_id")?;
        info!(
            "Checking availability of product ID: {} at store: {}",
            product_id, store_id
        );
        Ok(json!({"available": true, "quantity": 10, "store": store_id}))
    }
}

pub struct SchedulePlantingService;

#[async_trait]
impl Tool for SchedulePlantingService {
    fn name(&self) -> &'static str {
        "schedule_planting_service"
    }

    fn description(&self) -> &'static str {
        "Schedule a planting service appointment."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": customer_id_schema(),
                "date": {"type": "string", "description": "Desired date (YYYY-MM-DD)."},
                "time_range": {"type": "string", "description": "Desired time range, e.g. '9-12'."},
                "details": {"type": "string", "description": "Additional details, e.g. 'Planting Petunias'."}
            },
            "required": ["customer_id", "date", "time_range", "details"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, _ctx: &ToolContext) -> Result<Value> {
        let customer_id = required_str(args, "customer_id")?;
        let date = required_str(args, "date")?;
        let time_range = required_str(args, "time_range")?;
        let details = optional_str(args, "details").unwrap_or_default();

        info!(
            "Scheduling planting service for customer ID: {} on {} ({})",
            customer_id, date, time_range
        );
        info!("Details: {}", details);

        let start_hour = time_range.split('-').next().unwrap_or(time_range).trim();
        Ok(json!({
            "status": "success",
            "appointment_id": Uuid::new_v4().to_string(),
            "date": date,
            "time": time_range,
            "confirmation_time": format!("{} {}:00", date, start_hour)
        }))
    }
}

pub struct GetAvailablePlantingTimes;

#[async_trait]
impl Tool for GetAvailablePlantingTimes {
    fn name(&self) -> &'static str {
        "get_available_planting_times"
    }

    fn description(&self) -> &'static str {
        "List available planting service time slots for a date."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"date": {"type": "string", "description": "The date to check (YYYY-MM-DD)."}},
            "required": ["date"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, _ctx: &ToolContext) -> Result<Value> {
        let date = required_str(args, "date")?;
        info!("Retrieving available planting times for {}", date);
        Ok(json!(["9-12", "13-16"]))
    }
}

pub struct SendCareInstructions;

#[async_trait]
impl Tool for SendCareInstructions {
    fn name(&self) -> &'static str {
        "send_care_instructions"
    }

    fn description(&self) -> &'static str {
        "Send care instructions for a plant by email or SMS."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": customer_id_schema(),
                "plant_type": {"type": "string"},
                "delivery_method": {"type": "string", "enum": ["email", "sms"]}
            },
            "required": ["customer_id", "plant_type", "delivery_method"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, _ctx: &ToolContext) -> Result<Value> {
        let customer_id = required_str(args, "customer_id")?;
        let plant_type = required_str(args, "plant_type")?;
        let delivery_method = required_str(args, "delivery_method")?;
        info!(
            "Sending care instructions for {} to customer: {} via {}",
            plant_type, customer_id, delivery_method
        );
        Ok(json!({
            "status": "success",
            "message": format!("Care instructions for {} sent via {}.", plant_type, delivery_method)
        }))
    }
}

pub struct GenerateQrCode;

#[async_trait]
impl Tool for GenerateQrCode {
    fn name(&self) -> &'static str {
        "generate_qr_code"
    }

    fn description(&self) -> &'static str {
        "Generate a discount QR code for the customer."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": customer_id_schema(),
                "discount_value": {"type": "number", "description": "E.g. 10 for 10%."},
                "discount_type": {"type": "string", "enum": ["percentage", "fixed"]},
                "expiration_days": {"type": "integer"}
            },
            "required": ["customer_id", "discount_value", "discount_type", "expiration_days"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, ctx: &ToolContext) -> Result<Value> {
        let customer_id = required_str(args, "customer_id")?;
        let discount_value = required_f64(args, "discount_value")?;
        let discount_type = optional_str(args, "discount_type").unwrap_or_default();
        let expiration_days = required_i64(args, "expiration_days")?;

        // Limits hold even if the model was talked past its instructions.
        let limits = &ctx.discounts;
        if (discount_type.is_empty() || discount_type == "percentage")
            && discount_value > limits.max_percentage
        {
            return Ok(Value::String(format!(
                "cannot generate a QR code for this amount, must be {}% or less",
                limits.max_percentage
            )));
        }
        if discount_type == "fixed" && discount_value > limits.max_fixed {
            return Ok(Value::String(format!(
                "cannot generate a QR code for this amount, must be {} or less",
                limits.max_fixed
            )));
        }
        if expiration_days < 0 {
            return Err(AtendeError::InvalidInput(
                "expiration_days cannot be negative".to_string(),
            ));
        }

        info!(
            "Generating QR code for customer: {} with {} - {} discount.",
            customer_id, discount_value, discount_type
        );

        let expiration_date = (Local::now() + Duration::days(expiration_days)).format("%Y-%m-%d");
        Ok(json!({
            "status": "success",
            "qr_code_data": "MOCK_QR_CODE_DATA",
            "expiration_date": expiration_date.to_string()
        }))
    }
}

pub struct ApproveDiscount;

#[async_trait]
impl Tool for ApproveDiscount {
    fn name(&self) -> &'static str {
        "approve_discount"
    }

    fn description(&self) -> &'static str {
        "Approve a flat rate or percentage discount requested by the customer."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "discount_type": {"type": "string", "enum": ["percentage", "flat"]},
                "value": {"type": "number"},
                "reason": {"type": "string"}
            },
            "required": ["discount_type", "value", "reason"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, ctx: &ToolContext) -> Result<Value> {
        let discount_type = required_str(args, "discount_type")?;
        let value = required_f64(args, "value")?;
        let reason = optional_str(args, "reason").unwrap_or_default();
        let max = ctx.discounts.max_percentage;

        if value > max {
            info!("Denying {} discount of {}", discount_type, value);
            return Ok(json!({
                "status": "rejected",
                "message": format!("discount too large. Must be {} or less.", max)
            }));
        }

        info!(
            "Approving a {} discount of {} because {}",
            discount_type, value, reason
        );
        Ok(json!({"status": "ok"}))
    }
}

pub struct SyncAskForApproval;

#[async_trait]
impl Tool for SyncAskForApproval {
    fn name(&self) -> &'static str {
        "sync_ask_for_approval"
    }

    fn description(&self) -> &'static str {
        "Ask a manager to approve a discount and wait for the answer."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "discount_type": {"type": "string"},
                "value": {"type": "number"},
                "reason": {"type": "string"}
            },
            "required": ["discount_type", "value", "reason"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, _ctx: &ToolContext) -> Result<Value> {
        let value = required_f64(args, "value")?;
        let reason = optional_str(args, "reason").unwrap_or_default();
        info!("Asking for approval to apply a discount of {} because {}", value, reason);
        Ok(json!({"status": "approved"}))
    }
}

pub struct UpdateSalesforceCrm;

#[async_trait]
impl Tool for UpdateSalesforceCrm {
    fn name(&self) -> &'static str {
        "update_salesforce_crm"
    }

    fn description(&self) -> &'static str {
        "Record customer details such as appointments and discounts in the CRM."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": customer_id_schema(),
                "details": {"type": "object", "description": "Details to record."}
            },
            "required": ["customer_id", "details"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, _ctx: &ToolContext) -> Result<Value> {
        let customer_id = required_str(args, "customer_id")?;
        let details = args.get("details").cloned().unwrap_or(Value::Null);
        info!(
            "Updating Salesforce CRM for customer ID {} with details: {}",
            customer_id, details
        );
        Ok(json!({"status": "success", "message": "Salesforce record updated."}))
    }
}

pub struct SendCallCompanionLink;

#[async_trait]
impl Tool for SendCallCompanionLink {
    fn name(&self) -> &'static str {
        "send_call_companion_link"
    }

    fn description(&self) -> &'static str {
        "Send the customer a link to start a video session."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"phone_number": {"type": "string"}},
            "required": ["phone_number"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, _ctx: &ToolContext) -> Result<Value> {
        let phone_number = required_str(args, "phone_number")?;
        info!("Sending call companion link to {}", phone_number);
        Ok(json!({
            "status": "success",
            "message": format!("Link sent to {}", phone_number)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    async fn run(tool: &dyn Tool, call: Value) -> Result<Value> {
        tool.execute(&args(call), &ToolContext::offline()).await
    }

    #[tokio::test]
    async fn test_petunias_get_flowering_products() {
        let result = run(&GetProductRecommendations, json!({"plant_type": "petunias", "customer_id": "123"}))
            .await
            .unwrap();
        assert_eq!(result["recommendations"][0]["product_id"], "soil-456");

        let other = run(&GetProductRecommendations, json!({"plant_type": "cactus"})).await.unwrap();
        assert_eq!(other["recommendations"][0]["product_id"], "soil-123");
    }

    #[tokio::test]
    async fn test_schedule_confirmation_time() {
        let result = run(
            &SchedulePlantingService,
            json!({"customer_id": "123", "date": "2024-07-29", "time_range": "9-12", "details": "planting petunias"}),
        )
        .await
        .unwrap();
        assert_eq!(result["confirmation_time"], "2024-07-29 9:00");
        assert!(Uuid::parse_str(result["appointment_id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_qr_code_limits() {
        let too_much = run(
            &GenerateQrCode,
            json!({"customer_id": "123", "discount_value": 15, "discount_type": "percentage", "expiration_days": 30}),
        )
        .await
        .unwrap();
        assert!(too_much.as_str().unwrap().contains("10% or less"));

        let fixed = run(
            &GenerateQrCode,
            json!({"customer_id": "123", "discount_value": 25, "discount_type": "fixed", "expiration_days": 30}),
        )
        .await
        .unwrap();
        assert!(fixed.as_str().unwrap().contains("20 or less"));

        let ok = run(
            &GenerateQrCode,
            json!({"customer_id": "123", "discount_value": 15, "discount_type": "fixed", "expiration_days": 0}),
        )
        .await
        .unwrap();
        assert_eq!(ok["status"], "success");
        assert_eq!(ok["expiration_date"], Local::now().format("%Y-%m-%d").to_string());
    }

    #[tokio::test]
    async fn test_approve_discount_caps_value() {
        let rejected = run(&ApproveDiscount, json!({"discount_type": "percentage", "value": 11, "reason": "x"}))
            .await
            .unwrap();
        assert_eq!(rejected["status"], "rejected");

        let ok = run(&ApproveDiscount, json!({"discount_type": "flat", "value": 10, "reason": "x"}))
            .await
            .unwrap();
        assert_eq!(ok, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_modify_cart_reports_changes() {
        let result = run(
            &ModifyCart,
            json!({"customer_id": "123", "items_to_add": [{"product_id": "soil-456", "quantity": 1}], "items_to_remove": []}),
        )
        .await
        .unwrap();
        assert_eq!(result["items_added"], true);
        assert_eq!(result["items_removed"], false);
    }

    #[tokio::test]
    async fn test_missing_argument_is_an_error() {
        assert!(run(&CheckProductAvailability, json!({"product_id": "soil-456"})).await.is_err());
    }
}

//! Callback tools exposed to the model.
//!
//! Three tools: place an order, check availability, end the call. The first
//! two compute their reply locally; ending the call is handled by the
//! session because it touches the room.

use serde::Deserialize;
use serde_json::json;

use crate::AgentError;

/// Tool names as the model sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    OrderItems,
    CheckAvailability,
    EndCall,
}

impl ToolName {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "order_items" => Some(Self::OrderItems),
            "check_availability" => Some(Self::CheckAvailability),
            "end_call" => Some(Self::EndCall),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrderItems => "order_items",
            Self::CheckAvailability => "check_availability",
            Self::EndCall => "end_call",
        }
    }
}

#[derive(Deserialize)]
struct OrderArgs {
    item_name: String,
    quantity: i64,
}

#[derive(Deserialize)]
struct AvailabilityArgs {
    #[serde(default)]
    #[allow(dead_code)]
    date: String,
}

/// Places an order. Always succeeds; the confirmation echoes the arguments
/// back without validating them.
pub fn order_items(arguments: &str) -> Result<String, AgentError> {
    let args: OrderArgs = serde_json::from_str(arguments)?;
    Ok(format!(
        "Order for {} {} has been placed successfully.",
        args.quantity, args.item_name
    ))
}

/// Reports availability for a date. There is no calendar behind this; the
/// date is not parsed or validated and the answer is always yes.
pub fn check_availability(arguments: &str) -> Result<String, AgentError> {
    let _args: AvailabilityArgs = serde_json::from_str(arguments)?;
    Ok("true".to_string())
}

/// Tool schemas in the chat-completions `tools` array shape.
pub fn tool_specs() -> serde_json::Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "order_items",
                "description": "Place an order for an item on behalf of the caller.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "item_name": { "type": "string", "description": "Name of the item to order." },
                        "quantity": { "type": "integer", "description": "Number of units to order." }
                    },
                    "required": ["item_name", "quantity"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "check_availability",
                "description": "Check availability for a given date.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "date": { "type": "string", "description": "Date to check, in any format." }
                    },
                    "required": ["date"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "end_call",
                "description": "End the phone call after saying goodbye to the caller.",
                "parameters": {
                    "type": "object",
                    "properties": {}
                }
            }
        }
    ])
}

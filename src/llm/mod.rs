//! Provider-neutral model request types and the client trait.

mod openai;

pub use openai::{create_client, create_client_with_timeout, OpenAiModel};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// Argument object as produced by the model.
    pub arguments: Value,
}

/// One message of conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Text segments. Joined with newlines when sent.
    pub parts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![text.into()],
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            parts: vec![text.into()],
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Assistant turn that asks for tool calls.
    pub fn assistant_tool_calls(text: Option<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            role: Role::Assistant,
            parts: text.into_iter().collect(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Result of a tool call, fed back to the model.
    pub fn tool_result(tool_call_id: impl Into<String>, result: &Value) -> Self {
        let text = match result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            role: Role::Tool,
            parts: vec![text],
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    pub fn text(&self) -> String {
        self.parts.join("\n")
    }
}

/// Function tool advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the argument object.
    pub parameters: Value,
}

/// A complete outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl ModelRequest {
    /// Replace every empty text segment with a single space. The chat API
    /// rejects empty content. Returns how many segments were rewritten.
    pub fn fill_empty_text(&mut self) -> usize {
        let mut rewritten = 0;
        for part in self.messages.iter_mut().flat_map(|m| m.parts.iter_mut()) {
            if part.is_empty() {
                part.push(' ');
                rewritten += 1;
            }
        }
        rewritten
    }
}

/// What the model answered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

/// A generative model backend.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fill_empty_text() {
        let mut request = ModelRequest {
            model: "m".to_string(),
            system: String::new(),
            messages: vec![
                Message::user(""),
                Message {
                    role: Role::User,
                    parts: vec!["hello".to_string(), String::new()],
                    tool_calls: Vec::new(),
                    tool_call_id: None,
                },
            ],
            tools: Vec::new(),
            temperature: 0.7,
            max_output_tokens: 100,
        };

        assert_eq!(request.fill_empty_text(), 2);
        assert_eq!(request.messages[0].parts, vec![" "]);
        assert_eq!(request.messages[1].parts, vec!["hello", " "]);
        assert_eq!(request.fill_empty_text(), 0);
    }

    #[test]
    fn test_tool_result_text() {
        let rejection = Message::tool_result("call_1", &json!("No student profile selected."));
        assert_eq!(rejection.text(), "No student profile selected.");
        assert_eq!(rejection.tool_call_id.as_deref(), Some("call_1"));

        let structured = Message::tool_result("call_2", &json!({"status": "ok"}));
        assert_eq!(structured.text(), r#"{"status":"ok"}"#);
    }
}

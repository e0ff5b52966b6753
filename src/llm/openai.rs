//! OpenAI chat-completions backend.

use super::{Message, ModelClient, ModelReply, ModelRequest, Role, ToolInvocation};
use crate::config::ModelSettings;
use crate::error::{AtendeError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolArgs, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObjectArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client with the default timeout.
pub fn create_client() -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}

/// Chat model served by the OpenAI API.
pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiModel {
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_secs))?,
            model: settings.name.clone(),
        })
    }

    fn convert_messages(request: &ModelRequest) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(|e| AtendeError::Agent(e.to_string()))?
                .into(),
        ];

        for message in &request.messages {
            messages.push(Self::convert_message(message)?);
        }
        Ok(messages)
    }

    fn convert_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
        let built: ChatCompletionRequestMessage = match message.role {
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.text())
                .build()
                .map_err(|e| AtendeError::Agent(e.to_string()))?
                .into(),
            Role::Assistant => {
                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                if !message.parts.is_empty() {
                    args.content(message.text());
                }
                if !message.tool_calls.is_empty() {
                    let calls = message
                        .tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.to_string(),
                            },
                        })
                        .collect::<Vec<_>>();
                    args.tool_calls(calls);
                }
                args.build()
                    .map_err(|e| AtendeError::Agent(e.to_string()))?
                    .into()
            }
            Role::Tool => ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(message.tool_call_id.clone().unwrap_or_default())
                .content(message.text())
                .build()
                .map_err(|e| AtendeError::Agent(e.to_string()))?
                .into(),
        };
        Ok(built)
    }

    fn convert_tools(request: &ModelRequest) -> Result<Vec<ChatCompletionTool>> {
        request
            .tools
            .iter()
            .map(|spec| {
                let function = FunctionObjectArgs::default()
                    .name(spec.name.clone())
                    .description(spec.description.clone())
                    .parameters(spec.parameters.clone())
                    .build()
                    .map_err(|e| AtendeError::Agent(e.to_string()))?;
                ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(function)
                    .build()
                    .map_err(|e| AtendeError::Agent(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl ModelClient for OpenAiModel {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply> {
        let model = if request.model.is_empty() {
            &self.model
        } else {
            &request.model
        };

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model)
            .messages(Self::convert_messages(request)?)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_output_tokens);
        if !request.tools.is_empty() {
            args.tools(Self::convert_tools(request)?);
        }
        let chat_request = args.build().map_err(|e| AtendeError::Agent(e.to_string()))?;

        debug!(model = %model, messages = request.messages.len(), "Sending chat completion request");

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| AtendeError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AtendeError::Agent("No response from model".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let arguments = parse_arguments(&call.function.name, call.function.arguments);
                ToolInvocation {
                    id: call.id,
                    name: call.function.name,
                    arguments,
                }
            })
            .collect();

        Ok(ModelReply {
            text: choice.message.content,
            tool_calls,
        })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Decode the model's argument text. Text that isn't JSON is passed on
/// unchanged so the dispatcher can report the parse failure.
fn parse_arguments(tool: &str, raw: String) -> Value {
    match serde_json::from_str(&raw) {
        Ok(arguments) => arguments,
        Err(e) => {
            warn!(tool = %tool, error = %e, "Tool arguments are not valid JSON");
            Value::String(raw)
        }
    }
}

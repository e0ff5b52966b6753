//! Agent runner with tool calling loop.
//!
//! Every outbound model request passes the rate limiter first; every tool
//! call passes the gate before and after it runs.

use super::{Persona, Session};
use crate::config::{render_instruction, Prompts, Settings};
use crate::error::{AtendeError, Result};
use crate::gate::{Gate, GateOverride};
use crate::llm::{Message, ModelClient, ModelRequest, ToolInvocation};
use crate::rate_limit::RateLimiter;
use crate::session::SessionState;
use crate::tools::{Tool, ToolContext, ToolRegistry, UploadFileTool};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, warn};

/// Agent for one persona, shared by any number of sessions.
pub struct Agent {
    persona: Persona,
    model: Arc<dyn ModelClient>,
    tools: ToolRegistry,
    gate: Gate,
    limiter: RateLimiter,
    context: Arc<ToolContext>,
    prompts: Prompts,
    model_name: String,
    temperature: f32,
    max_output_tokens: u32,
    max_iterations: usize,
}

impl Agent {
    /// Create an agent wired from settings.
    pub fn new(
        persona: Persona,
        model: Arc<dyn ModelClient>,
        settings: &Settings,
        context: Arc<ToolContext>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self {
            persona,
            model,
            tools: persona.tools(),
            gate: persona.gate(&settings.discounts),
            limiter: RateLimiter::from_settings(&settings.rate_limit),
            context,
            prompts,
            model_name: settings.model.name.clone(),
            temperature: settings.model.temperature,
            max_output_tokens: settings.model.max_output_tokens,
            max_iterations: settings.model.max_iterations,
        })
    }

    /// Replace the rate limiter.
    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Run one user turn to completion.
    pub async fn run(&self, session: &mut Session, input: &str) -> Result<AgentResponse> {
        if session.persona != self.persona {
            return Err(AtendeError::Session(format!(
                "session belongs to the {} persona, not {}",
                session.persona, self.persona
            )));
        }

        session.history.push(Message::user(input));
        let system = render_instruction(&self.prompts, &session.instruction_context());
        let specs = self.tools.specs();

        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(AtendeError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let mut request = ModelRequest {
                model: self.model_name.clone(),
                system: system.clone(),
                messages: session.history.clone(),
                tools: specs.clone(),
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            };
            self.admit(&mut session.state, &mut request);

            let reply = self.model.generate(&request).await?;

            if reply.tool_calls.is_empty() {
                let content = reply.text.unwrap_or_default();
                session.history.push(Message::assistant(content.clone()));
                return Ok(AgentResponse {
                    content,
                    tool_calls: tool_calls_made,
                    iterations,
                });
            }

            session.history.push(Message::assistant_tool_calls(
                reply.text.clone(),
                reply.tool_calls.clone(),
            ));

            for call in &reply.tool_calls {
                let record = self.dispatch(&mut session.state, call).await;
                session.history.push(Message::tool_result(&call.id, &record.result));
                tool_calls_made.push(record);
            }
        }
    }

    /// Store a file the user attached as a session artifact.
    ///
    /// This is a host action, not a model tool call, so the content skips
    /// argument normalization.
    pub async fn attach(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> Result<Value> {
        let mut args = Map::new();
        args.insert("content".to_string(), json!(STANDARD.encode(bytes)));
        args.insert("mime_type".to_string(), json!(mime_type));
        args.insert("filename".to_string(), json!(filename));
        UploadFileTool.execute(&args, &self.context).await
    }

    /// Rate-limit a request. The limiter may block, so on a multi-threaded
    /// runtime the worker is handed off first.
    fn admit(&self, state: &mut SessionState, request: &mut ModelRequest) -> Option<Duration> {
        let multi_thread = Handle::try_current()
            .map(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread)
            .unwrap_or(false);

        if multi_thread {
            tokio::task::block_in_place(|| self.limiter.before_model_request(state, request))
        } else {
            self.limiter.before_model_request(state, request)
        }
    }

    /// Execute a single tool call and return a record of it.
    async fn dispatch(&self, state: &mut SessionState, call: &ToolInvocation) -> ToolCallRecord {
        info!("Agent calling tool: {} with args: {}", call.name, call.arguments);

        let tool = match self.tools.require(&call.name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(tool = %call.name, "Model asked for an unknown tool");
                return ToolCallRecord {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    result: Value::String(e.to_string()),
                    intercepted: false,
                };
            }
        };

        let parsed = match &call.arguments {
            Value::Object(map) => Ok(map.clone()),
            // Argument text the model client couldn't decode.
            Value::String(raw) => serde_json::from_str::<Map<String, Value>>(raw).map_err(|e| e.to_string()),
            _ => Err("arguments must be a JSON object".to_string()),
        };
        let args = match parsed {
            Ok(args) => args,
            Err(reason) => {
                return ToolCallRecord {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    result: Value::String(format!("Failed to parse tool call: {}", reason)),
                    intercepted: false,
                };
            }
        };

        self.invoke(tool, args, state).await
    }

    /// Run one tool between the gate's two phases.
    async fn invoke(
        &self,
        tool: &dyn Tool,
        mut args: Map<String, Value>,
        state: &mut SessionState,
    ) -> ToolCallRecord {
        let name = tool.name();

        let (response, intercepted) = match self.gate.before_call(name, &mut args, state) {
            Some(answer @ GateOverride::Rejection(_)) => {
                return ToolCallRecord {
                    name: name.to_string(),
                    arguments: Value::Object(args),
                    result: answer.into_value(),
                    intercepted: true,
                };
            }
            // A rule answered for the tool; its answer still gets the post-call pass.
            Some(answer) => (answer.into_value(), true),
            None => match tool.execute(&args, &self.context).await {
                Ok(response) => (response, false),
                Err(e) => {
                    warn!(tool = name, error = %e, "Tool call failed");
                    return ToolCallRecord {
                        name: name.to_string(),
                        arguments: Value::Object(args),
                        result: Value::String(format!("Tool error: {}", e)),
                        intercepted: false,
                    };
                }
            },
        };

        let (result, intercepted) = match self.gate.after_call(name, &args, &response, state) {
            Some(answer) => (answer.into_value(), true),
            None => (response, intercepted),
        };

        ToolCallRecord {
            name: name.to_string(),
            arguments: Value::Object(args),
            result,
            intercepted,
        }
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (model calls) used.
    pub iterations: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// Arguments after gate normalization.
    pub arguments: Value,
    /// What the model was given back.
    pub result: Value,
    /// Whether the gate answered instead of, or after, the tool.
    pub intercepted: bool,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

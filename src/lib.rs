//! Atende - customer service and virtual professor assistants
//!
//! Two conversational agents built around a small core: a heuristic that
//! decides whether a student's question needs a picture, a gate that wraps
//! every tool call, and a per-session rate limiter for model requests.
//!
//! # Architecture
//!
//! - `classifier` - Visual-necessity classifier
//! - `gate` - Argument normalization, identity validation and tool rules
//! - `rate_limit` - Quota-per-window throttling of model requests
//! - `session` - Session state and identity profiles
//! - `tools` - Mocked customer-service and professor tools
//! - `artifacts` - Named binary artifacts (audio, images)
//! - `transcription` - Speech-to-text backends and result cache
//! - `llm` - Provider-neutral model client
//! - `agent` - Personas, sessions and the tool-calling loop
//! - `config` - Settings and prompt templates
//!
//! # Example
//!
//! ```rust,no_run
//! use atende::agent::{Agent, Persona, Session};
//! use atende::config::Settings;
//! use atende::llm::OpenAiModel;
//! use atende::session::MockIdentityDirectory;
//! use atende::tools::ToolContext;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let model = Arc::new(OpenAiModel::new(&settings.model)?);
//!     let context = Arc::new(ToolContext::from_settings(&settings)?);
//!     let agent = Agent::new(Persona::Professor, model, &settings, context)?;
//!
//!     let mut session =
//!         Session::bootstrap(Persona::Professor, &MockIdentityDirectory, None, &settings.session)?;
//!     let response = agent.run(&mut session, "O que é uma fração?").await?;
//!     println!("{}", response.content);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod artifacts;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod llm;
pub mod rate_limit;
pub mod session;
pub mod tools;
pub mod transcription;

pub use error::{AtendeError, Result};

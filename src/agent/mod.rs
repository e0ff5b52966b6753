//! Conversational agents: personas, sessions and the tool-calling loop.

mod persona;
mod runner;
mod session;

pub use persona::Persona;
pub use runner::{Agent, AgentResponse, ToolCallRecord};
pub use session::Session;

//! CLI command implementations.

mod chat;
mod classify;
mod config;
mod tools;

pub use chat::run_chat;
pub use classify::run_classify;
pub use config::run_config;
pub use tools::run_tools;

//! Configuration module for Atende.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{
    render_error_message, render_instruction, render_welcome, CustomerServicePrompts, ErrorKind,
    InstructionContext, MessagePrompts, ProfessorPrompts, Prompts,
};
pub use settings::{
    ClassifierSettings, DiscountSettings, GeneralSettings, ImageSettings, ModelSettings,
    PromptSettings, RateLimitSettings, SessionSettings, Settings, TranscriptionProvider,
    TranscriptionSettings,
};

//! CLI module for Atende.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::agent::Persona;
use clap::{Parser, Subcommand};

/// Atende - customer service and virtual professor assistants
///
/// Talk to either assistant from the terminal, inspect their tools, or try
/// the visual-need classifier on its own.
#[derive(Parser, Debug)]
#[command(name = "atende")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Assistant to talk to (customer or professor)
        #[arg(short, long, default_value = "professor")]
        persona: Persona,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Customer or student id to bind to the session
        #[arg(long)]
        profile_id: Option<String>,
    },

    /// Decide whether a question needs an image to be answered
    Classify {
        /// The question text
        text: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the tools an assistant can call
    Tools {
        /// Assistant whose tools to list (customer or professor)
        #[arg(short, long, default_value = "professor")]
        persona: Persona,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

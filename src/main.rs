//! Atende CLI entry point.

use anyhow::Result;
use atende::cli::{commands, Cli, Commands};
use atende::config::Settings;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("atende={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Execute command
    match &cli.command {
        Commands::Chat {
            persona,
            model,
            profile_id,
        } => {
            std::fs::create_dir_all(settings.data_dir())?;
            commands::run_chat(*persona, model.clone(), profile_id.clone(), settings).await?;
        }

        Commands::Classify { text, json } => {
            commands::run_classify(text, *json, &settings)?;
        }

        Commands::Tools { persona } => {
            commands::run_tools(*persona, &settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}

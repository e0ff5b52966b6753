//! Interactive chat command.

use crate::agent::{Agent, Persona, Session};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{render_error_message, render_welcome, ErrorKind, Settings};
use crate::error::AtendeError;
use crate::llm::OpenAiModel;
use crate::session::MockIdentityDirectory;
use crate::tools::ToolContext;
use anyhow::{Context, Result};
use console::style;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Run the interactive chat command.
pub async fn run_chat(
    persona: Persona,
    model: Option<String>,
    profile_id: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.model.name = model;
    }

    let client = Arc::new(OpenAiModel::new(&settings.model)?);
    let context = Arc::new(ToolContext::from_settings(&settings)?);
    let agent = Agent::new(persona, client, &settings, context)?;
    let mut session = Session::bootstrap(
        persona,
        &MockIdentityDirectory,
        profile_id.as_deref(),
        &settings.session,
    )?;
    info!(session = %session.id, %persona, model = %agent.model_name(), "Chat session started");

    println!("\n{}", style(format!("Atende · {}", persona.display_name())).bold().cyan());
    println!(
        "{}\n",
        style("Type your message, or 'exit' to quit. Use 'clear' to reset the conversation and '/attach <file>' to upload a file.").dim()
    );

    if persona == Persona::Professor {
        let name = session.state.identity_profile().map(|p| p.name);
        let welcome = render_welcome(agent.prompts(), session.is_first_interaction(), name.as_deref());
        println!("{} {}\n", style("Atende:").cyan().bold(), welcome);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear_history();
            Output::info("Conversation history cleared.");
            continue;
        }

        if let Some(path) = input.strip_prefix("/attach ") {
            if let Err(e) = attach(&agent, path.trim()).await {
                Output::error(&format!("Upload failed: {:#}", e));
            }
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let outcome = agent.run(&mut session, input).await;
        spinner.finish_and_clear();

        match outcome {
            Ok(response) => {
                for call in &response.tool_calls {
                    Output::tool_call(call);
                }
                println!("\n{} {}\n", style("Atende:").cyan().bold(), response.content);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
                if persona == Persona::Professor {
                    let message = render_error_message(agent.prompts(), &error_kind(&e));
                    println!("\n{} {}\n", style("Atende:").cyan().bold(), message);
                }
            }
        }
    }

    Ok(())
}

/// Upload a local file as a session artifact.
async fn attach(agent: &Agent, path: &str) -> Result<()> {
    let path = Path::new(path);
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("file name is not valid UTF-8")?;

    let result = agent.attach(filename, mime_for_path(path), &bytes).await?;
    if result["success"] == true {
        Output::success(&format!(
            "Uploaded '{}' (version {}, {} bytes)",
            result["filename"].as_str().unwrap_or(filename),
            result["version"],
            result["size"]
        ));
    } else {
        Output::warning(result["error"].as_str().unwrap_or("upload rejected"));
    }
    Ok(())
}

/// What to tell a student when a turn fails.
fn error_kind(error: &AtendeError) -> ErrorKind {
    match error {
        AtendeError::Transcription(_) => ErrorKind::Audio,
        AtendeError::Artifact(_) => ErrorKind::Image,
        _ => ErrorKind::Other("responder sua pergunta".to_string()),
    }
}

/// MIME type from the file extension. The subtype is what the transcriber
/// treats as the audio format.
fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mp3",
        "m4a" => "audio/m4a",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "aif" | "aiff" => "audio/aiff",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

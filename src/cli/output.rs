//! CLI output formatting utilities.

use crate::agent::ToolCallRecord;
use crate::classifier::ClassificationResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one tool call made during a turn.
    pub fn tool_call(record: &ToolCallRecord) {
        let marker = if record.intercepted {
            style("⇄").yellow()
        } else {
            style("✓").green()
        };
        let result = match &record.result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!(
            "  {} {} {}",
            marker,
            style(&record.name).dim(),
            style(content_preview(&result, 80)).dim()
        );
    }

    /// Print a classifier verdict.
    pub fn classification(result: &ClassificationResult) {
        let verdict = if result.needs_image {
            style("needs an image").yellow().bold()
        } else {
            style("answerable from text").green().bold()
        };
        println!("{} {}", style(">>").cyan().bold(), verdict);
        Self::kv("confidence", &format!("{:.2}", result.confidence));
        if !result.matched_phrases.is_empty() {
            let phrases: Vec<&str> = result.matched_phrases.iter().map(String::as_str).collect();
            Self::kv("matched", &phrases.join(", "));
        }
        Self::kv("rationale", &result.rationale);
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

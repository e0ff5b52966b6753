//! Tools command implementation.

use crate::agent::Persona;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// List the tools and gate rules for a persona.
pub fn run_tools(persona: Persona, settings: &Settings) -> Result<()> {
    let tools = persona.tools();
    let rules = persona.rules(&settings.discounts);

    Output::header(&format!("{} tools ({})", persona.display_name(), tools.len()));
    for spec in tools.specs() {
        let marker = if rules.get(&spec.name).is_some() { " [gated]" } else { "" };
        Output::list_item(&format!("{}{}: {}", spec.name, marker, spec.description));
    }
    println!();
    Output::kv(
        "identity argument",
        persona.identity_kind().arg_key(),
    );
    Ok(())
}

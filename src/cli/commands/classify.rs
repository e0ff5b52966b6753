//! Classify command implementation.

use crate::classifier::VisualNeedClassifier;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the classifier on one utterance.
pub fn run_classify(text: &str, json: bool, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Classify, settings)?;

    let classifier = VisualNeedClassifier::with_threshold(settings.classifier.threshold);
    let result = classifier.classify(text);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        Output::classification(&result);
    }
    Ok(())
}

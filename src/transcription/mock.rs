//! Offline transcriber returning a fixed text.

use super::{TranscriptText, Transcriber};
use crate::error::{AtendeError, Result};
use async_trait::async_trait;
use tracing::info;

const SIMULATED_TEXT: &str = "Este é um texto simulado da transcrição do áudio do artefato.";

/// Simulated transcription for development and tests.
#[derive(Debug, Clone, Default)]
pub struct MockTranscriber {
    text: Option<String>,
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &[u8], mime_type: &str, language: &str) -> Result<TranscriptText> {
        if audio.is_empty() {
            return Err(AtendeError::Transcription("audio is empty".to_string()));
        }
        info!(bytes = audio.len(), mime_type, "Simulating transcription");

        Ok(TranscriptText {
            text: self.text.clone().unwrap_or_else(|| SIMULATED_TEXT.to_string()),
            detected_language: language.to_string(),
            confidence: "high".to_string(),
            notes: String::new(),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

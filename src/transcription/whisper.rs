//! OpenAI Whisper transcription implementation.

use super::{format_from_mime, TranscriptText, Transcriber};
use crate::error::{AtendeError, Result};
use crate::llm::create_client;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber with the default model.
    pub fn new() -> Result<Self> {
        Self::with_model("whisper-1")
    }

    pub fn with_model(model: &str) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    async fn transcribe(&self, audio: &[u8], mime_type: &str, language: &str) -> Result<TranscriptText> {
        debug!("Transcribing audio with {}", self.model);

        // Whisper infers the container from the file extension.
        let filename = format!("audio.{}", format_from_mime(mime_type));

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(filename, audio.to_vec()))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        // Whisper takes ISO-639-1 codes, so "pt-BR" becomes "pt".
        let language = language.split('-').next().unwrap_or_default();
        if !language.is_empty() {
            request_builder.language(language);
        }

        let request = request_builder
            .build()
            .map_err(|e| AtendeError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| AtendeError::OpenAI(format!("Whisper API error: {}", e)))?;

        debug!(duration = response.duration, "Whisper transcription finished");

        Ok(TranscriptText {
            text: response.text.trim().to_string(),
            detected_language: response.language,
            confidence: "high".to_string(),
            notes: String::new(),
        })
    }

    fn name(&self) -> &str {
        "whisper"
    }
}

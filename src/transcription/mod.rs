//! Speech-to-text for uploaded audio artifacts.
//!
//! Backends implement [`Transcriber`]. The [`TranscriptionCache`] is owned
//! by whoever builds the tool context and shared across sessions.

mod cache;
mod mock;
mod whisper;

pub use cache::TranscriptionCache;
pub use mock::MockTranscriber;
pub use whisper::WhisperTranscriber;

use crate::config::{TranscriptionProvider, TranscriptionSettings};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Audio container formats accepted for transcription.
pub const SUPPORTED_FORMATS: &[&str] = &["wav", "mp3", "m4a", "ogg", "flac", "aac", "mpeg", "aiff"];

/// Text produced by a transcriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptText {
    pub text: String,
    pub detected_language: String,
    /// "high", "medium" or "low".
    pub confidence: String,
    pub notes: String,
}

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe in-memory audio. `mime_type` is the artifact's declared type.
    async fn transcribe(&self, audio: &[u8], mime_type: &str, language: &str) -> Result<TranscriptText>;

    /// Backend name used in logs.
    fn name(&self) -> &str;
}

/// Build the configured transcription backend.
pub fn create_transcriber(settings: &TranscriptionSettings) -> Result<Arc<dyn Transcriber>> {
    match settings.provider {
        TranscriptionProvider::Mock => Ok(Arc::new(MockTranscriber::new())),
        TranscriptionProvider::Whisper => Ok(Arc::new(WhisperTranscriber::with_model(&settings.model)?)),
    }
}

/// Format from a MIME type: the part after the last `/`.
pub fn format_from_mime(mime_type: &str) -> &str {
    match mime_type.rsplit_once('/') {
        Some((_, format)) => format,
        None => "unknown",
    }
}

/// Rough duration from the byte size and a typical bitrate for the format.
pub fn estimate_duration_secs(size_bytes: usize, format: &str) -> f64 {
    const PCM_STEREO_BYTES_PER_SEC: f64 = 44_100.0 * 2.0 * 2.0;
    let bytes = size_bytes as f64;
    let kbps = |rate: f64| bytes * 8.0 / (rate * 1000.0);

    match format {
        "mp3" | "mpeg" | "aac" => kbps(128.0),
        "m4a" => kbps(96.0),
        "ogg" => kbps(160.0),
        "wav" | "aiff" => bytes / PCM_STEREO_BYTES_PER_SEC,
        "flac" => bytes / (PCM_STEREO_BYTES_PER_SEC * 0.6),
        // 16 kHz mono
        _ => bytes / (16_000.0 * 2.0),
    }
}

//! Virtual professor tools: audio transcription, visual-need analysis,
//! image analysis and speech synthesis over session artifacts.

use super::{failure, required_str, Tool, ToolContext, ToolRegistry};
use crate::error::Result;
use crate::transcription::{estimate_duration_secs, format_from_mime, TranscriptionCache, SUPPORTED_FORMATS};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Local;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

const MIB: f64 = 1024.0 * 1024.0;

/// Tools the professor model may call.
pub fn professor_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(TranscribeAudio);
    registry.register(AnalyzeVisualNeed);
    registry.register(AnalyzeEducationalImage);
    registry.register(GenerateTtsAudio);
    registry
}

pub struct TranscribeAudio;

#[async_trait]
impl Tool for TranscribeAudio {
    fn name(&self) -> &'static str {
        "transcribe_audio"
    }

    fn description(&self) -> &'static str {
        "Transcribe an uploaded audio artifact to text."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "audio_artifact_name": {
                    "type": "string",
                    "description": "Name of the audio artifact, e.g. 'pergunta_aluno_123.wav'."
                }
            },
            "required": ["audio_artifact_name"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, ctx: &ToolContext) -> Result<Value> {
        let name = required_str(args, "audio_artifact_name")?;

        let Some(artifact) = ctx.artifacts.load(name).await? else {
            return Ok(failure(format!("Audio artifact '{}' not found.", name)));
        };
        if artifact.data.is_empty() {
            return Ok(failure("Could not extract audio data from the artifact."));
        }

        let format = format_from_mime(&artifact.mime_type);
        if !SUPPORTED_FORMATS.contains(&format) {
            return Ok(failure(format!(
                "Format '{}' is not supported. Use: {}",
                format,
                SUPPORTED_FORMATS.join(", ")
            )));
        }

        let size = artifact.size();
        if size > ctx.transcription.max_audio_bytes {
            let mut result = failure(format!(
                "File too large ({:.1}MB). Maximum: {:.0}MB.",
                size as f64 / MIB,
                ctx.transcription.max_audio_bytes as f64 / MIB
            ));
            result["suggestion"] = json!("Split the recording into shorter questions.");
            return Ok(result);
        }

        let key = TranscriptionCache::key_for(&artifact.data);
        if let Some(mut cached) = ctx.transcription_cache.get(&key) {
            debug!(key = %key, "Transcription cache hit");
            cached["from_cache"] = json!(true);
            return Ok(cached);
        }

        let transcript = match ctx
            .transcriber
            .transcribe(&artifact.data, &artifact.mime_type, &ctx.transcription.language)
            .await
        {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!(error = %e, "Transcription failed");
                return Ok(failure(format!("Error transcribing audio: {}", e)));
            }
        };

        let words = transcript.text.split_whitespace().count();
        let chars = transcript.text.chars().count();
        let duration = estimate_duration_secs(size, format);
        let words_per_minute = if duration > 0.0 {
            (words as f64 / duration * 60.0).round() as u64
        } else {
            0
        };

        let mut result = json!({
            "success": true,
            "text": transcript.text,
            "duration_secs": (duration * 10.0).round() / 10.0,
            "format": format,
            "size_bytes": size,
            "detected_language": transcript.detected_language,
            "statistics": {
                "total_words": words,
                "total_chars": chars,
                "words_per_minute": words_per_minute
            },
            "quality": {
                "confidence": transcript.confidence,
                "notes": transcript.notes
            }
        });

        let filename = format!("transcript_{}.txt", Local::now().format("%Y%m%d_%H%M%S"));
        match ctx
            .artifacts
            .save(&filename, "text/plain", transcript.text.clone().into_bytes())
            .await
        {
            Ok(version) => {
                result["saved_file"] = json!(filename);
                result["version"] = json!(version);
            }
            Err(e) => warn!(error = %e, "Could not save transcript artifact"),
        }

        ctx.transcription_cache.insert(key, result.clone());
        info!(words, backend = ctx.transcriber.name(), "Audio transcribed");
        Ok(result)
    }
}

pub struct AnalyzeVisualNeed;

#[async_trait]
impl Tool for AnalyzeVisualNeed {
    fn name(&self) -> &'static str {
        "analyze_visual_need"
    }

    fn description(&self) -> &'static str {
        "Decide whether the student's question refers to something visual that must be seen before answering."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"text": {"type": "string", "description": "The transcribed question."}},
            "required": ["text"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, ctx: &ToolContext) -> Result<Value> {
        let text = required_str(args, "text")?;
        let result = ctx.classifier.classify(text);
        debug!(confidence = result.confidence, needs_image = result.needs_image, "Visual need classified");
        Ok(serde_json::to_value(result)?)
    }
}

pub struct AnalyzeEducationalImage;

#[async_trait]
impl Tool for AnalyzeEducationalImage {
    fn name(&self) -> &'static str {
        "analyze_educational_image"
    }

    fn description(&self) -> &'static str {
        "Extract educational content from an uploaded image of an exercise."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "image_artifact_name": {"type": "string"},
                "question_context": {"type": "string", "description": "What the student asked about the image."}
            },
            "required": ["image_artifact_name", "question_context"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, ctx: &ToolContext) -> Result<Value> {
        let name = required_str(args, "image_artifact_name")?;
        let question_context = super::optional_str(args, "question_context").unwrap_or_default();

        let image_failure = |message: String| {
            let mut result = failure(message);
            result["adequate_quality"] = json!(false);
            result
        };

        let Some(artifact) = ctx.artifacts.load(name).await? else {
            return Ok(image_failure(format!("Image artifact '{}' not found.", name)));
        };

        let limits = &ctx.images;
        let size = artifact.size();
        if size > limits.max_image_bytes {
            return Ok(image_failure(format!(
                "Image too large (maximum {:.0}MB)",
                limits.max_image_bytes as f64 / MIB
            )));
        }

        let low_quality = size < limits.low_quality_below_bytes;
        info!(name, size, low_quality, "Analyzing educational image");
        let suggested_action = if low_quality {
            json!("Image may be low resolution")
        } else {
            Value::Null
        };

        Ok(json!({
            "success": true,
            "content_type": "math_exercise",
            "detected_elements": ["quadratic equation", "parabola graph"],
            "educational_context": "Math exercise about quadratic functions",
            "adequate_quality": !low_quality,
            "suggested_action": suggested_action,
            "size_bytes": size,
            "question_context": question_context
        }))
    }
}

pub struct GenerateTtsAudio;

#[async_trait]
impl Tool for GenerateTtsAudio {
    fn name(&self) -> &'static str {
        "generate_tts_audio"
    }

    fn description(&self) -> &'static str {
        "Synthesize a spoken version of a text answer as an audio artifact."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {"type": "string"},
                "speed": {"type": "number", "description": "Speaking rate, 1.0 is normal."},
                "voice": {"type": "string", "description": "Voice name, e.g. 'pt-BR-Standard-A'."}
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, ctx: &ToolContext) -> Result<Value> {
        let text = super::optional_str(args, "text").unwrap_or_default();
        if text.trim().is_empty() {
            return Ok(failure("Empty text provided"));
        }

        let mut audio = b"simulated_tts_audio_".to_vec();
        audio.extend_from_slice(text.as_bytes());

        let name = format!("tts_response_{}.mp3", Uuid::new_v4());
        ctx.artifacts.save(&name, "audio/mpeg", audio).await?;
        info!(artifact = %name, "Speech generated");

        Ok(json!({
            "success": true,
            "generated_artifact_name": name,
            "character_count": text.chars().count()
        }))
    }
}

/// Stores a file sent by the client as an artifact.
///
/// Called by the session host rather than the model: the content is base64
/// and must not go through argument lower-casing.
pub struct UploadFileTool;

#[async_trait]
impl Tool for UploadFileTool {
    fn name(&self) -> &'static str {
        "upload_file"
    }

    fn description(&self) -> &'static str {
        "Store an uploaded file (base64 content) as a session artifact."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": {"type": "string", "description": "Base64-encoded file content."},
                "mime_type": {"type": "string"},
                "filename": {"type": "string"}
            },
            "required": ["content", "mime_type", "filename"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>, ctx: &ToolContext) -> Result<Value> {
        let fields = ["content", "mime_type", "filename"];
        let [content, mime_type, filename] = fields.map(|key| super::optional_str(args, key));
        let (Some(content), Some(mime_type), Some(filename)) = (content, mime_type, filename) else {
            return Ok(failure("Missing required fields: content, mime_type, or filename"));
        };

        let bytes = match STANDARD.decode(content) {
            Ok(bytes) => bytes,
            Err(e) => return Ok(failure(format!("Invalid base64 encoding: {}", e))),
        };

        // Tool arguments reach tools lower-cased, so names are stored that way.
        let filename = filename.to_lowercase();
        let size = bytes.len();
        let version = match ctx.artifacts.save(&filename, mime_type, bytes).await {
            Ok(version) => version,
            Err(e) => return Ok(failure(format!("Artifact store unavailable: {}", e))),
        };

        Ok(json!({
            "success": true,
            "filename": filename,
            "version": version,
            "size": size
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{ArtifactStore, MemoryArtifactStore};
    use crate::transcription::MockTranscriber;
    use std::sync::Arc;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn context() -> (ToolContext, Arc<MemoryArtifactStore>) {
        let store = Arc::new(MemoryArtifactStore::new());
        let ctx = ToolContext::offline()
            .with_artifacts(store.clone())
            .with_transcriber(Arc::new(MockTranscriber::with_text("o que é isso aqui na figura")));
        (ctx, store)
    }

    #[tokio::test]
    async fn test_transcription_uses_cache_on_repeat() {
        let (ctx, store) = context();
        store.save("q.wav", "audio/wav", vec![7u8; 176_400]).await.unwrap();

        let first = TranscribeAudio
            .execute(&args(json!({"audio_artifact_name": "q.wav"})), &ctx)
            .await
            .unwrap();
        assert_eq!(first["success"], true);
        assert_eq!(first["text"], "o que é isso aqui na figura");
        assert_eq!(first["duration_secs"], 1.0);
        assert_eq!(first["statistics"]["total_words"], 7);
        assert!(first.get("from_cache").is_none());
        assert!(first["saved_file"].as_str().unwrap().starts_with("transcript_"));

        let second = TranscribeAudio
            .execute(&args(json!({"audio_artifact_name": "q.wav"})), &ctx)
            .await
            .unwrap();
        assert_eq!(second["from_cache"], true);
        assert_eq!(second["text"], first["text"]);
    }

    #[tokio::test]
    async fn test_transcription_rejects_bad_input() {
        let (ctx, store) = context();
        store.save("clip.webm", "audio/webm", vec![1, 2, 3]).await.unwrap();

        let missing = TranscribeAudio
            .execute(&args(json!({"audio_artifact_name": "nope.wav"})), &ctx)
            .await
            .unwrap();
        assert_eq!(missing["success"], false);

        let unsupported = TranscribeAudio
            .execute(&args(json!({"audio_artifact_name": "clip.webm"})), &ctx)
            .await
            .unwrap();
        assert!(unsupported["error"].as_str().unwrap().contains("'webm'"));
    }

    #[tokio::test]
    async fn test_visual_need_tool_wraps_classifier() {
        let (ctx, _) = context();
        let result = AnalyzeVisualNeed
            .execute(&args(json!({"text": "olhe essa figura aqui"})), &ctx)
            .await
            .unwrap();
        assert_eq!(result["needs_image"], true);
        assert!(result["matched_phrases"].as_array().unwrap().len() >= 3);
    }

    #[tokio::test]
    async fn test_small_image_is_flagged_low_quality() {
        let (ctx, store) = context();
        store.save("exercise.png", "image/png", vec![0; 2_000]).await.unwrap();
        store.save("big.png", "image/png", vec![0; 6 * 1024 * 1024]).await.unwrap();

        let small = AnalyzeEducationalImage
            .execute(&args(json!({"image_artifact_name": "exercise.png", "question_context": "q"})), &ctx)
            .await
            .unwrap();
        assert_eq!(small["success"], true);
        assert_eq!(small["adequate_quality"], false);
        assert_eq!(small["suggested_action"], "Image may be low resolution");

        let big = AnalyzeEducationalImage
            .execute(&args(json!({"image_artifact_name": "big.png", "question_context": "q"})), &ctx)
            .await
            .unwrap();
        assert_eq!(big["success"], false);
        assert_eq!(big["adequate_quality"], false);
    }

    #[tokio::test]
    async fn test_tts_saves_artifact() {
        let (ctx, store) = context();
        let empty = GenerateTtsAudio.execute(&args(json!({"text": "  "})), &ctx).await.unwrap();
        assert_eq!(empty["success"], false);

        let result = GenerateTtsAudio
            .execute(&args(json!({"text": "muito bem"})), &ctx)
            .await
            .unwrap();
        let name = result["generated_artifact_name"].as_str().unwrap();
        assert!(name.starts_with("tts_response_") && name.ends_with(".mp3"));
        assert_eq!(store.load(name).await.unwrap().unwrap().mime_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_upload_decodes_base64() {
        let (ctx, store) = context();
        let call = json!({"content": STANDARD.encode(b"RIFF....WAVE"), "mime_type": "audio/wav", "filename": "Pergunta.wav"});

        let first = UploadFileTool.execute(&args(call.clone()), &ctx).await.unwrap();
        assert_eq!(first, json!({"success": true, "filename": "pergunta.wav", "version": 0, "size": 12}));
        let second = UploadFileTool.execute(&args(call), &ctx).await.unwrap();
        assert_eq!(second["version"], 1);
        assert_eq!(store.load("pergunta.wav").await.unwrap().unwrap().data, b"RIFF....WAVE");

        let bad = UploadFileTool
            .execute(&args(json!({"content": "%%%", "mime_type": "audio/wav", "filename": "x.wav"})), &ctx)
            .await
            .unwrap();
        assert_eq!(bad["success"], false);

        let missing = UploadFileTool.execute(&args(json!({"content": ""})), &ctx).await.unwrap();
        assert_eq!(missing["success"], false);
    }
}

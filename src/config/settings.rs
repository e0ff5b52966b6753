//! Configuration settings for Atende.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub rate_limit: RateLimitSettings,
    pub classifier: ClassifierSettings,
    pub transcription: TranscriptionSettings,
    pub images: ImageSettings,
    pub discounts: DiscountSettings,
    pub session: SessionSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.atende".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Generative model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Chat model used by both agents.
    pub name: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Upper bound on model round-trips in a single user turn.
    pub max_iterations: usize,
    /// HTTP timeout for model requests.
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_output_tokens: 1000,
            max_iterations: 15,
            timeout_secs: 300,
        }
    }
}

/// Outbound model request throttling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Requests allowed per window.
    pub quota: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            quota: 10,
            window_secs: 60,
        }
    }
}

/// Visual-necessity classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Confidence at or above which an image is requested.
    pub threshold: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

/// Transcription backend type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProvider {
    /// Simulated transcription, no network access.
    #[default]
    Mock,
    /// OpenAI Whisper.
    Whisper,
}

impl std::str::FromStr for TranscriptionProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(TranscriptionProvider::Mock),
            "whisper" | "openai" => Ok(TranscriptionProvider::Whisper),
            _ => Err(format!("Unknown transcription provider: {}", s)),
        }
    }
}

impl std::fmt::Display for TranscriptionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionProvider::Mock => write!(f, "mock"),
            TranscriptionProvider::Whisper => write!(f, "whisper"),
        }
    }
}

/// Transcription tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub provider: TranscriptionProvider,
    /// Whisper model (whisper provider only).
    pub model: String,
    /// Preferred transcription language.
    pub language: String,
    /// Entries kept in the transcription cache before eviction.
    pub cache_max_size: usize,
    /// Largest audio artifact accepted for inline transcription.
    pub max_audio_bytes: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: TranscriptionProvider::Mock,
            model: "whisper-1".to_string(),
            language: "pt".to_string(),
            cache_max_size: 50,
            max_audio_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Educational image analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub max_image_bytes: usize,
    /// Images smaller than this are flagged as possibly low resolution.
    pub low_quality_below_bytes: usize,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            max_image_bytes: 5 * 1024 * 1024,
            low_quality_below_bytes: 10_000,
        }
    }
}

/// Discount business rules for the customer-service agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountSettings {
    /// Approval requests at or below this value skip the manager.
    pub auto_approve_max: f64,
    /// Largest percentage discount a QR code or approval may carry.
    pub max_percentage: f64,
    /// Largest fixed-amount discount a QR code may carry.
    pub max_fixed: f64,
}

impl Default for DiscountSettings {
    fn default() -> Self {
        Self {
            auto_approve_max: 10.0,
            max_percentage: 10.0,
            max_fixed: 20.0,
        }
    }
}

/// Session bootstrap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Customer bound to a session when none is requested.
    pub default_customer_id: String,
    /// Student bound to a session when none is requested.
    pub default_student_id: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_customer_id: "123".to_string(),
            default_student_id: "default_student".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AtendeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("atende")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_limits() {
        let settings = Settings::default();
        assert_eq!(settings.rate_limit.quota, 10);
        assert_eq!(settings.rate_limit.window_secs, 60);
        assert_eq!(settings.classifier.threshold, 0.5);
        assert_eq!(settings.transcription.cache_max_size, 50);
        assert_eq!(settings.session.default_customer_id, "123");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [rate_limit]
            quota = 3

            [transcription]
            provider = "whisper"
            "#,
        )
        .unwrap();

        assert_eq!(settings.rate_limit.quota, 3);
        assert_eq!(settings.rate_limit.window_secs, 60);
        assert_eq!(settings.transcription.provider, TranscriptionProvider::Whisper);
        assert_eq!(settings.model.max_iterations, 15);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.model.name = "gpt-4.1".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.model.name, "gpt-4.1");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.discounts.auto_approve_max, 10.0);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("Whisper".parse::<TranscriptionProvider>().unwrap(), TranscriptionProvider::Whisper);
        assert_eq!("mock".parse::<TranscriptionProvider>().unwrap(), TranscriptionProvider::Mock);
        assert!("gemini".parse::<TranscriptionProvider>().is_err());
    }
}

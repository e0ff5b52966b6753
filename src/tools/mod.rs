//! Domain tools the agents can call.
//!
//! Every tool receives its arguments after the gate has normalized and
//! validated them. Domain failures (unknown artifact, oversized upload) are
//! returned as `{"success": false, "error": ...}` values; an `Err` means the
//! call itself was malformed.

mod customer;
mod professor;

pub use customer::customer_service_tools;
pub use professor::{professor_tools, UploadFileTool};

use crate::artifacts::{ArtifactStore, MemoryArtifactStore};
use crate::classifier::VisualNeedClassifier;
use crate::config::{DiscountSettings, ImageSettings, Settings, TranscriptionSettings};
use crate::error::{AtendeError, Result};
use crate::llm::ToolSpec;
use crate::transcription::{create_transcriber, MockTranscriber, Transcriber, TranscriptionCache};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the argument object.
    fn parameters(&self) -> Value;

    async fn execute(&self, args: &Map<String, Value>, ctx: &ToolContext) -> Result<Value>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Shared services and limits available to tools.
pub struct ToolContext {
    pub artifacts: Arc<dyn ArtifactStore>,
    pub transcriber: Arc<dyn Transcriber>,
    pub transcription_cache: Arc<TranscriptionCache>,
    pub classifier: Arc<VisualNeedClassifier>,
    pub transcription: TranscriptionSettings,
    pub images: ImageSettings,
    pub discounts: DiscountSettings,
}

impl ToolContext {
    /// Context wired from settings, with an in-memory artifact store.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            artifacts: Arc::new(MemoryArtifactStore::new()),
            transcriber: create_transcriber(&settings.transcription)?,
            transcription_cache: Arc::new(TranscriptionCache::new(settings.transcription.cache_max_size)),
            classifier: Arc::new(VisualNeedClassifier::with_threshold(settings.classifier.threshold)),
            transcription: settings.transcription.clone(),
            images: settings.images.clone(),
            discounts: settings.discounts.clone(),
        })
    }

    /// Offline context with default limits.
    pub fn offline() -> Self {
        let settings = Settings::default();
        Self {
            artifacts: Arc::new(MemoryArtifactStore::new()),
            transcriber: Arc::new(MockTranscriber::new()),
            transcription_cache: Arc::new(TranscriptionCache::new(settings.transcription.cache_max_size)),
            classifier: Arc::new(VisualNeedClassifier::new()),
            transcription: settings.transcription,
            images: settings.images,
            discounts: settings.discounts,
        }
    }

    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactStore>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = transcriber;
        self
    }
}

/// Tools available to one agent, by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    /// Like [`get`](Self::get), but an unknown name is an error.
    pub fn require(&self, name: &str) -> Result<&dyn Tool> {
        self.get(name)
            .ok_or_else(|| AtendeError::Tool(format!("Unknown tool: {}", name)))
    }

    /// Specs for every tool, sorted by name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|tool| tool.spec()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Result for a domain failure the model should see and recover from.
pub fn failure(message: impl Into<String>) -> Value {
    json!({"success": false, "error": message.into()})
}

pub fn required_str<'a>(args: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AtendeError::InvalidInput(format!("missing string argument '{}'", key)))
}

pub fn optional_str<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Numeric argument; numeric strings are accepted too.
pub fn required_f64(args: &Map<String, Value>, key: &str) -> Result<f64> {
    let value = args
        .get(key)
        .ok_or_else(|| AtendeError::InvalidInput(format!("missing numeric argument '{}'", key)))?;
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| AtendeError::InvalidInput(format!("argument '{}' is not a number", key)))
}

pub fn required_i64(args: &Map<String, Value>, key: &str) -> Result<i64> {
    let value = required_f64(args, key)?;
    if value.fract() != 0.0 {
        return Err(AtendeError::InvalidInput(format!("argument '{}' must be a whole number", key)));
    }
    Ok(value as i64)
}

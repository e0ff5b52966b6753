//! Versioned binary artifacts shared between the user and the tools
//! (uploaded audio and images, generated speech, transcripts).

use crate::error::{AtendeError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// One stored version of a named artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub version: u32,
}

impl Artifact {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Storage for named, versioned artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Latest version of `name`, if any.
    async fn load(&self, name: &str) -> Result<Option<Artifact>>;

    /// Store a new version of `name` and return its version number.
    async fn save(&self, name: &str, mime_type: &str, data: Vec<u8>) -> Result<u32>;

    /// Names of all stored artifacts.
    async fn list(&self) -> Result<Vec<String>>;
}

/// In-memory artifact store. Versions start at 0 per name.
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<String, Vec<Artifact>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self {
            artifacts: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> AtendeError {
    AtendeError::Artifact("artifact store lock poisoned".to_string())
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn load(&self, name: &str) -> Result<Option<Artifact>> {
        let artifacts = self.artifacts.read().map_err(poisoned)?;
        Ok(artifacts.get(name).and_then(|versions| versions.last().cloned()))
    }

    async fn save(&self, name: &str, mime_type: &str, data: Vec<u8>) -> Result<u32> {
        if name.trim().is_empty() {
            return Err(AtendeError::Artifact("artifact name is empty".to_string()));
        }

        let mut artifacts = self.artifacts.write().map_err(poisoned)?;
        let versions = artifacts.entry(name.to_string()).or_default();
        let version = versions.len() as u32;
        versions.push(Artifact {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            data,
            version,
        });
        tracing::debug!(name, version, "Artifact saved");
        Ok(version)
    }

    async fn list(&self) -> Result<Vec<String>> {
        let artifacts = self.artifacts.read().map_err(poisoned)?;
        let mut names: Vec<String> = artifacts.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

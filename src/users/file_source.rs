//! JSON file of user profiles, for seeding and offline runs.

use crate::error::SourceError;
use crate::types::UserProfile;
use crate::users::UserSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonFileUserSource {
    path: PathBuf,
}

impl JsonFileUserSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file synchronously.
    pub fn load(&self) -> Result<Vec<UserProfile>, SourceError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            SourceError::Unavailable(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            SourceError::Unavailable(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl UserSource for JsonFileUserSource {
    async fn fetch_all(&self) -> Result<Vec<UserProfile>, SourceError> {
        self.load()
    }
}

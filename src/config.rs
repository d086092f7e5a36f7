//! Configuration System
//!
//! Layered configuration for batch runs: built-in defaults, the global config file,
//! workspace config files and `CHALLENGE__*` environment overrides, merged with the
//! `config` crate and validated as a whole.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

pub use crate::batch::BatchConfig;
pub use crate::prompt::PromptConfig;
pub use crate::provider::{ProviderConfig, ProviderType};

mod facade;
mod merge;
mod sources;
mod workspace;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use workspace::StorageConfig;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Fan-out, timeout and retry settings for a run
    #[serde(default)]
    pub batch: BatchConfig,

    /// Model provider used for generation
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Prompt template settings
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Storage paths
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Batch(String),
    Provider(String),
    Prompt(String),
    Storage(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Batch(msg) => write!(f, "Batch: {}", msg),
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Prompt(msg) => write!(f, "Prompt: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl FactoryConfig {
    /// Validate the entire configuration, collecting every violation.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.batch.validate() {
            errors.push(ValidationError::Batch(e));
        }
        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.prompt.validate() {
            errors.push(ValidationError::Prompt(e));
        }
        if self.storage.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "Store path cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

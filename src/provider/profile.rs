//! Provider configuration as it appears in config files.

use super::{CompletionOptions, ModelProvider};
use crate::error::ProviderError;
use serde::{Deserialize, Serialize};

/// Supported provider backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Ollama,
    #[default]
    Gemini,
}

impl ProviderType {
    /// Environment variable consulted when no API key is configured.
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::Ollama => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Ollama => "ollama",
            ProviderType::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider section of the factory config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// Falls back to the provider's conventional environment variable. Never written out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL override
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub default_options: CompletionOptions,
}

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            model: default_model(),
            api_key: None,
            endpoint: None,
            default_options: CompletionOptions::default(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(format!(
                    "Endpoint must start with http:// or https://: {}",
                    endpoint
                ));
            }
        }
        if let Some(temp) = self.default_options.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(format!("Temperature must be between 0.0 and 2.0, got {}", temp));
            }
        }
        Ok(())
    }

    /// Configured key, else the provider's environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.provider_type
                    .api_key_env_var()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|k| !k.trim().is_empty())
            })
    }

    pub fn to_model_provider(&self) -> Result<ModelProvider, ProviderError> {
        let model = self.model.clone();
        let base_url = self.endpoint.clone();
        let api_key = || {
            self.resolve_api_key().ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "No API key for provider {}; set provider.api_key or {}",
                    self.provider_type,
                    self.provider_type.api_key_env_var().unwrap_or("an API key")
                ))
            })
        };

        Ok(match self.provider_type {
            ProviderType::Ollama => ModelProvider::Ollama { model, base_url },
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model,
                api_key: api_key()?,
                base_url,
            },
            ProviderType::Anthropic => ModelProvider::Anthropic {
                model,
                api_key: api_key()?,
                base_url,
            },
            ProviderType::Gemini => ModelProvider::Gemini {
                model,
                api_key: api_key()?,
                base_url,
            },
        })
    }
}

//! Error types for the challenge factory.
//!
//! Each external boundary gets its own error enum so per-user failures can be
//! classified precisely; `ApiError` is the process-level umbrella used by the CLI.

use thiserror::Error;

/// User source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("User source unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt user document {user_id}: {message}")]
    Corrupt { user_id: String, message: String },
}

/// Raw model provider errors (transport level)
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Provider returned status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Provider request timed out: {0}")]
    Timeout(String),

    #[error("Provider transport error: {0}")]
    Transport(String),

    #[error("Provider returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Generation client errors, one per failure kind a unit can observe while generating
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Generation timed out after {0} ms")]
    Timeout(u64),

    #[error("Generation rate limited: {0}")]
    RateLimited(String),

    #[error("Generation service error {code}: {message}")]
    ServiceError { code: u16, message: String },

    #[error("Generation returned an empty response")]
    EmptyResponse,
}

/// Result store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Result store unavailable: {0}")]
    Unavailable(String),

    #[error("Write conflict for user {user_id}")]
    WriteConflict { user_id: String },

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Process-level errors surfaced by the CLI and run entry points
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StoreError),

    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),

    #[error("Prompt template error: {0}")]
    TemplateError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<ProviderError> for GenerationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited(message) => GenerationError::RateLimited(message),
            ProviderError::Status { code, message } => {
                if code == 429 {
                    GenerationError::RateLimited(message)
                } else {
                    GenerationError::ServiceError { code, message }
                }
            }
            // Elapsed time is unknown here; ProviderGenerationClient fills it in.
            ProviderError::Timeout(_) => GenerationError::Timeout(0),
            // No HTTP status: reported as a gateway-style service error.
            ProviderError::Transport(message) => GenerationError::ServiceError { code: 503, message },
            ProviderError::InvalidResponse(message) => {
                GenerationError::ServiceError { code: 502, message }
            }
            ProviderError::NotConfigured(message) => {
                GenerationError::ServiceError { code: 400, message }
            }
        }
    }
}

pub(crate) fn to_store_unavailable(err: sled::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

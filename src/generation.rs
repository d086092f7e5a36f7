//! Generation client: one prompt in, one trimmed challenge text out.
//!
//! A `generate` call is a single attempt bounded by the configured timeout. Retries are
//! driven by the batch coordinator through [`RetryPolicy`] so every attempt is counted
//! in the run report.

use crate::error::{GenerationError, ProviderError};
use crate::provider::{ChatMessage, CompletionOptions, ModelProviderClient};
use crate::types::{ChallengeText, GenerationRequest};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

pub mod retry;

pub use retry::RetryPolicy;

/// Generation boundary used by the batch coordinator
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Perform one generation attempt for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<ChallengeText, GenerationError>;
}

/// [`GenerationClient`] backed by a model provider
pub struct ProviderGenerationClient {
    provider: Arc<dyn ModelProviderClient>,
    options: CompletionOptions,
    timeout: Duration,
}

impl ProviderGenerationClient {
    pub fn new(
        provider: Arc<dyn ModelProviderClient>,
        options: CompletionOptions,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            options,
            timeout,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }
}

#[async_trait]
impl GenerationClient for ProviderGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<ChallengeText, GenerationError> {
        // Only the prompt is sent; the user id stays with the request
        let messages = vec![ChatMessage::user(request.prompt())];
        let start = Instant::now();

        let completion = tokio::time::timeout(
            self.timeout,
            self.provider.complete(messages, self.options.clone()),
        )
        .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let response = match completion {
            Err(_) => return Err(GenerationError::Timeout(self.timeout.as_millis() as u64)),
            Ok(Err(ProviderError::Timeout(_))) => return Err(GenerationError::Timeout(elapsed_ms)),
            Ok(Err(err)) => return Err(err.into()),
            Ok(Ok(response)) => response,
        };

        debug!(
            provider = self.provider.provider_name(),
            model = %response.model,
            duration_ms = elapsed_ms,
            completion_tokens = response.usage.completion_tokens,
            "Provider returned completion"
        );

        ChallengeText::parse(&response.content).ok_or(GenerationError::EmptyResponse)
    }
}

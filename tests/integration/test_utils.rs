//! Shared fakes for pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use challenge_factory::batch::{BatchConfig, BatchCoordinator};
use challenge_factory::error::{GenerationError, SourceError, StoreError};
use challenge_factory::generation::GenerationClient;
use challenge_factory::prompt::{PromptBuilder, PromptTemplate};
use challenge_factory::store::ResultStore;
use challenge_factory::types::{ArtifactRecord, ChallengeText, GenerationRequest, GenerationResult, UserProfile};
use challenge_factory::users::{MemoryUserSource, UserSource};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

pub fn builder() -> PromptBuilder {
    PromptBuilder::new(PromptTemplate::builtin("es").unwrap(), 15, run_date())
}

/// Small, fast retry settings
pub fn fast_config(max_concurrent_users: usize) -> BatchConfig {
    BatchConfig {
        max_concurrent_users,
        generation_timeout_secs: 5,
        retry_attempts: 3,
        retry_base_delay_ms: 1,
        retry_max_delay_ms: 5,
        run_deadline_secs: None,
    }
}

pub fn coordinator(
    users: Vec<UserProfile>,
    client: Arc<dyn GenerationClient>,
    store: Arc<dyn ResultStore>,
    config: BatchConfig,
) -> BatchCoordinator {
    BatchCoordinator::new(
        Arc::new(MemoryUserSource::new(users)),
        builder(),
        client,
        store,
        config,
    )
}

/// Per-user scripted responses; falls back to a fixed challenge once a script runs dry.
#[derive(Default)]
pub struct ScriptedClient {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, GenerationError>>>>,
    calls: Mutex<HashMap<String, usize>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, user_id: &str, responses: Vec<Result<String, GenerationError>>) -> Self {
        self.scripts
            .lock()
            .insert(user_id.to_string(), responses.into_iter().collect());
        self
    }

    pub fn calls_for(&self, user_id: &str) -> usize {
        self.calls.lock().get(user_id).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<ChallengeText, GenerationError> {
        *self
            .calls
            .lock()
            .entry(request.user_id().to_string())
            .or_default() += 1;
        self.prompts.lock().push(request.prompt().to_string());

        let next = self
            .scripts
            .lock()
            .get_mut(request.user_id())
            .and_then(|script| script.pop_front());
        let raw = match next {
            Some(response) => response?,
            None => format!("Reto del día para {}", request.user_id()),
        };
        ChallengeText::parse(&raw).ok_or(GenerationError::EmptyResponse)
    }
}

/// Records how many generations overlap
#[derive(Default)]
pub struct ConcurrencyProbe {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub delay: Duration,
}

impl ConcurrencyProbe {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for ConcurrencyProbe {
    async fn generate(&self, _request: &GenerationRequest) -> Result<ChallengeText, GenerationError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ChallengeText::parse("Respira hondo cinco veces.").unwrap())
    }
}

/// Never answers within any test's patience
pub struct HangingClient;

#[async_trait]
impl GenerationClient for HangingClient {
    async fn generate(&self, _request: &GenerationRequest) -> Result<ChallengeText, GenerationError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(GenerationError::Timeout(3_600_000))
    }
}

/// Panics for one user, answers everyone else
pub struct PanickingClient {
    pub user_id: String,
}

#[async_trait]
impl GenerationClient for PanickingClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<ChallengeText, GenerationError> {
        if request.user_id() == self.user_id {
            panic!("client bug");
        }
        Ok(ChallengeText::parse("Escribe tres cosas que agradeces.").unwrap())
    }
}

pub struct UnavailableSource;

#[async_trait]
impl UserSource for UnavailableSource {
    async fn fetch_all(&self) -> Result<Vec<UserProfile>, SourceError> {
        Err(SourceError::Unavailable("connection refused".to_string()))
    }
}

/// Rejects writes for the listed users
pub struct FailingStore {
    pub failing: Vec<String>,
    inner: challenge_factory::store::MemoryResultStore,
}

impl FailingStore {
    pub fn new(failing: &[&str]) -> Self {
        Self {
            failing: failing.iter().map(|s| s.to_string()).collect(),
            inner: challenge_factory::store::MemoryResultStore::new(),
        }
    }
}

#[async_trait]
impl ResultStore for FailingStore {
    async fn upsert(
        &self,
        user_id: &str,
        result: &GenerationResult,
    ) -> Result<ArtifactRecord, StoreError> {
        if self.failing.iter().any(|id| id == user_id) {
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        self.inner.upsert(user_id, result).await
    }

    async fn get(&self, user_id: &str) -> Result<Option<ArtifactRecord>, StoreError> {
        self.inner.get(user_id).await
    }

    async fn list(&self) -> Result<Vec<ArtifactRecord>, StoreError> {
        self.inner.list().await
    }
}

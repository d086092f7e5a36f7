//! Batch Coordination
//!
//! Runs the build → generate → persist pipeline for every user in a snapshot, at most
//! `max_concurrent_users` at a time. Per-user faults become [`RunOutcome`]s; only a
//! failure to read the snapshot aborts the run.

use crate::error::ApiError;
use crate::generation::{GenerationClient, RetryPolicy};
use crate::prompt::PromptBuilder;
use crate::store::ResultStore;
use crate::types::UserProfile;
use crate::users::UserSource;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

pub mod report;
pub mod unit;

pub use report::{FailureKind, RunCounts, RunOutcome, RunReport, RunScope};
pub use unit::UnitState;

use report::{SKIP_DUPLICATE_USER_ID, SKIP_USER_NOT_FOUND};
use unit::{run_unit, UnitContext};

/// Batch section of the factory config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Upper bound on units admitted at once
    #[serde(default = "default_max_concurrent_users")]
    pub max_concurrent_users: usize,

    /// Wait bound for a single generation call
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Total generation attempts per unit, including the first
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Whole-run deadline; the run is cancelled when it elapses
    #[serde(default)]
    pub run_deadline_secs: Option<u64>,
}

fn default_max_concurrent_users() -> usize {
    10
}

fn default_generation_timeout_secs() -> u64 {
    60
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    8000
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_users: default_max_concurrent_users(),
            generation_timeout_secs: default_generation_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            run_deadline_secs: None,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_users == 0 {
            return Err("max_concurrent_users must be at least 1".to_string());
        }
        if self.generation_timeout_secs == 0 {
            return Err("generation_timeout_secs must be at least 1".to_string());
        }
        if self.retry_attempts == 0 {
            return Err("retry_attempts must be at least 1".to_string());
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(format!(
                "retry_base_delay_ms ({}) exceeds retry_max_delay_ms ({})",
                self.retry_base_delay_ms, self.retry_max_delay_ms
            ));
        }
        if self.run_deadline_secs == Some(0) {
            return Err("run_deadline_secs must be at least 1 when set".to_string());
        }
        Ok(())
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }
}

/// Drives one run over explicit dependencies
pub struct BatchCoordinator {
    source: Arc<dyn UserSource>,
    builder: Arc<PromptBuilder>,
    client: Arc<dyn GenerationClient>,
    store: Arc<dyn ResultStore>,
    config: BatchConfig,
}

impl BatchCoordinator {
    pub fn new(
        source: Arc<dyn UserSource>,
        builder: PromptBuilder,
        client: Arc<dyn GenerationClient>,
        store: Arc<dyn ResultStore>,
        config: BatchConfig,
    ) -> Self {
        Self {
            source,
            builder: Arc::new(builder),
            client,
            store,
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Execute one run.
    ///
    /// Returns `Err` only when the user snapshot cannot be read. Cancelling `cancel`
    /// (or reaching the configured deadline) stops admission; the partial report is
    /// still returned with `cancelled` set.
    pub async fn run(
        &self,
        scope: RunScope,
        cancel: CancellationToken,
    ) -> Result<RunReport, ApiError> {
        let mut report = RunReport::new(Utc::now(), scope.clone());
        let span = info_span!("run", run_id = %report.run_id);

        async move {
            info!(scope = %scope, "Run started");

            let (profiles, preset) = match self.snapshot(&scope).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    error!(error = %err, "User snapshot unavailable, aborting run");
                    return Err(err);
                }
            };
            for outcome in preset {
                report.record(outcome);
            }

            if profiles.is_empty() {
                report.finish(Utc::now(), false);
                info!(total = report.counts.total, "Run finished with nothing to generate");
                return Ok(report);
            }

            let run_token = cancel.child_token();
            let deadline = self.config.run_deadline().map(|deadline| {
                let token = run_token.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(deadline).await;
                    info!(deadline_secs = deadline.as_secs(), "Run deadline reached, cancelling");
                    token.cancel();
                })
            });

            self.fan_out(profiles, &run_token, &mut report).await;

            if let Some(handle) = deadline {
                handle.abort();
            }
            report.finish(Utc::now(), run_token.is_cancelled());

            info!(
                total = report.counts.total,
                succeeded = report.counts.succeeded,
                skipped = report.counts.skipped,
                failed = report.counts.failed,
                cancelled = report.cancelled,
                duration_ms = report.duration_ms().unwrap_or_default(),
                "Run finished"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Read the users in scope, splitting off profiles that must not be processed.
    async fn snapshot(
        &self,
        scope: &RunScope,
    ) -> Result<(Vec<UserProfile>, Vec<RunOutcome>), ApiError> {
        let snapshot = match scope {
            RunScope::All => self.source.fetch_all().await?,
            RunScope::User(user_id) => match self.source.fetch_one(user_id).await? {
                Some(profile) => vec![profile],
                None => {
                    return Ok((
                        Vec::new(),
                        vec![RunOutcome::skipped(user_id.clone(), SKIP_USER_NOT_FOUND)],
                    ))
                }
            },
        };
        info!(users = snapshot.len(), "User snapshot taken");

        let mut seen = HashSet::new();
        let mut profiles = Vec::with_capacity(snapshot.len());
        let mut preset = Vec::new();
        for profile in snapshot {
            // Blank ids fall through to the identity check in the prompt builder
            if !profile.user_id.trim().is_empty() && !seen.insert(profile.user_id.clone()) {
                preset.push(RunOutcome::skipped(profile.user_id, SKIP_DUPLICATE_USER_ID));
                continue;
            }
            profiles.push(profile);
        }
        Ok((profiles, preset))
    }

    async fn fan_out(
        &self,
        profiles: Vec<UserProfile>,
        run_token: &CancellationToken,
        report: &mut RunReport,
    ) {
        let gate = Arc::new(Semaphore::new(self.config.max_concurrent_users));
        let ctx = Arc::new(UnitContext {
            builder: Arc::clone(&self.builder),
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
            retry: self.config.retry_policy(),
            cancel: run_token.clone(),
        });

        let mut units = FuturesUnordered::new();
        let mut pending = profiles.into_iter();

        while let Some(profile) = pending.next() {
            let permit = tokio::select! {
                biased;
                _ = run_token.cancelled() => None,
                permit = Arc::clone(&gate).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                report.record(RunOutcome::failed(
                    profile.user_id,
                    FailureKind::Cancelled,
                    "run cancelled before admission",
                    0,
                ));
                break;
            };

            let user_id = profile.user_id.clone();
            let unit_span = info_span!("unit", user_id = %user_id);
            let handle = tokio::spawn(
                {
                    let ctx = Arc::clone(&ctx);
                    async move {
                        let outcome = run_unit(ctx, profile).await;
                        // Slot is released as soon as the unit is terminal
                        drop(permit);
                        outcome
                    }
                }
                .instrument(unit_span),
            );
            units.push(async move { (user_id, handle.await) });
        }

        for profile in pending {
            report.record(RunOutcome::failed(
                profile.user_id,
                FailureKind::Cancelled,
                "run cancelled before admission",
                0,
            ));
        }

        while let Some((user_id, joined)) = units.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    error!(user_id = %user_id, error = %join_err, "Unit task aborted");
                    RunOutcome::failed(
                        user_id,
                        FailureKind::Internal,
                        format!("unit task aborted: {}", join_err),
                        0,
                    )
                }
            };
            report.record(outcome);
        }
    }
}

//! Run outcomes and the aggregated run report.

use crate::error::GenerationError;
use crate::types::GenerationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

pub const SKIP_USER_NOT_FOUND: &str = "user not found";
pub const SKIP_DUPLICATE_USER_ID: &str = "duplicate user id";

static RUN_SEQ: AtomicU32 = AtomicU32::new(0);

/// Which users a run covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum RunScope {
    All,
    User(String),
}

impl std::fmt::Display for RunScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunScope::All => f.write_str("all users"),
            RunScope::User(user_id) => write!(f, "user {}", user_id),
        }
    }
}

/// Why a unit failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    RateLimited,
    ServiceError,
    EmptyResponse,
    Persistence,
    Cancelled,
    Internal,
}

impl From<&GenerationError> for FailureKind {
    fn from(err: &GenerationError) -> Self {
        match err {
            GenerationError::Timeout(_) => FailureKind::Timeout,
            GenerationError::RateLimited(_) => FailureKind::RateLimited,
            GenerationError::ServiceError { .. } => FailureKind::ServiceError,
            GenerationError::EmptyResponse => FailureKind::EmptyResponse,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::ServiceError => "service_error",
            FailureKind::EmptyResponse => "empty_response",
            FailureKind::Persistence => "persistence",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Terminal result of one unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded {
        result: GenerationResult,
        attempts: u32,
    },
    SkippedInvalidProfile {
        user_id: String,
        reason: String,
    },
    Failed {
        user_id: String,
        kind: FailureKind,
        message: String,
        attempts: u32,
    },
}

impl RunOutcome {
    pub fn skipped(user_id: impl Into<String>, reason: impl Into<String>) -> Self {
        RunOutcome::SkippedInvalidProfile {
            user_id: user_id.into(),
            reason: reason.into(),
        }
    }

    pub fn failed(
        user_id: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
        attempts: u32,
    ) -> Self {
        RunOutcome::Failed {
            user_id: user_id.into(),
            kind,
            message: message.into(),
            attempts,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            RunOutcome::Succeeded { result, .. } => &result.user_id,
            RunOutcome::SkippedInvalidProfile { user_id, .. } => user_id,
            RunOutcome::Failed { user_id, .. } => user_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RunOutcome::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Commutative outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunCounts {
    pub fn record(&mut self, outcome: &RunOutcome) {
        self.total += 1;
        match outcome {
            RunOutcome::Succeeded { .. } => self.succeeded += 1,
            RunOutcome::SkippedInvalidProfile { .. } => self.skipped += 1,
            RunOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Structured outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Sorts by start time
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub scope: RunScope,
    /// True when the run was cancelled (deadline or operator) before every unit finished
    pub cancelled: bool,
    pub counts: RunCounts,
    /// Completion order; carries no meaning
    pub outcomes: Vec<RunOutcome>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>, scope: RunScope) -> Self {
        Self {
            run_id: generate_run_id(started_at),
            started_at,
            finished_at: None,
            scope,
            cancelled: false,
            counts: RunCounts::default(),
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: RunOutcome) {
        self.counts.record(&outcome);
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self, finished_at: DateTime<Utc>, cancelled: bool) {
        self.finished_at = Some(finished_at);
        self.cancelled = cancelled;
    }

    /// Succeeded share of all outcomes, in percent; 0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.counts.total == 0 {
            0.0
        } else {
            self.counts.succeeded as f64 * 100.0 / self.counts.total as f64
        }
    }

    pub fn outcome_for(&self, user_id: &str) -> Option<&RunOutcome> {
        self.outcomes.iter().find(|o| o.user_id() == user_id)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RunOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RunOutcome::Failed { .. }))
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

fn generate_run_id(started_at: DateTime<Utc>) -> String {
    let seq = RUN_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}-{}-{:04}",
        started_at.format("%Y%m%dT%H%M%S%3fZ"),
        std::process::id(),
        seq % 10_000
    )
}

//! One unit of work: build, generate, persist for a single user.

use crate::batch::report::{FailureKind, RunOutcome};
use crate::generation::{GenerationClient, RetryPolicy};
use crate::prompt::{PromptBuilder, PromptOutcome};
use crate::store::ResultStore;
use crate::types::{GenerationResult, UserProfile};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of a unit; terminal states are final
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    Building,
    Generating,
    Persisting,
    Succeeded,
    Skipped,
    Failed,
}

impl UnitState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UnitState::Succeeded | UnitState::Skipped | UnitState::Failed
        )
    }

    pub fn for_outcome(outcome: &RunOutcome) -> Self {
        match outcome {
            RunOutcome::Succeeded { .. } => UnitState::Succeeded,
            RunOutcome::SkippedInvalidProfile { .. } => UnitState::Skipped,
            RunOutcome::Failed { .. } => UnitState::Failed,
        }
    }
}

/// Shared, read-only dependencies of every unit in a run
pub(crate) struct UnitContext {
    pub builder: Arc<PromptBuilder>,
    pub client: Arc<dyn GenerationClient>,
    pub store: Arc<dyn ResultStore>,
    pub retry: RetryPolicy,
    pub cancel: CancellationToken,
}

/// Drive one admitted unit to a terminal state.
///
/// Cancellation is honoured while building and generating (including backoff waits).
/// Once persistence starts the unit runs to completion.
pub(crate) async fn run_unit(ctx: Arc<UnitContext>, profile: UserProfile) -> RunOutcome {
    let user_id = profile.user_id.clone();
    transition(&user_id, UnitState::Pending);
    let outcome = drive(&ctx, profile).await;
    transition(&user_id, UnitState::for_outcome(&outcome));
    outcome
}

async fn drive(ctx: &UnitContext, profile: UserProfile) -> RunOutcome {
    let user_id = profile.user_id.clone();
    let started = Instant::now();

    transition(&user_id, UnitState::Building);
    if ctx.cancel.is_cancelled() {
        return cancelled(&user_id, 0);
    }
    let request = match ctx.builder.build(&profile) {
        PromptOutcome::Request(request) => request,
        PromptOutcome::Skip(reason) => {
            info!(user_id = %user_id, reason = %reason, "Profile skipped");
            return RunOutcome::skipped(user_id, reason);
        }
    };

    transition(&user_id, UnitState::Generating);
    let mut attempt: u32 = 1;
    let text = loop {
        let generated = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return cancelled(&user_id, attempt),
            generated = ctx.client.generate(&request) => generated,
        };

        match generated {
            Ok(text) => break text,
            Err(err) if ctx.retry.should_retry(attempt, &err) => {
                let delay = ctx.retry.delay_for(attempt);
                warn!(
                    user_id = %user_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient generation failure, retrying"
                );
                tokio::select! {
                    biased;
                    _ = ctx.cancel.cancelled() => return cancelled(&user_id, attempt),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
            Err(err) => {
                warn!(user_id = %user_id, attempt, error = %err, "Generation failed");
                return RunOutcome::failed(user_id, FailureKind::from(&err), err.to_string(), attempt);
            }
        }
    };

    transition(&user_id, UnitState::Persisting);
    let result = GenerationResult::new(&profile, text, Utc::now());
    match ctx.store.upsert(&user_id, &result).await {
        Ok(record) => {
            info!(
                user_id = %user_id,
                attempts = attempt,
                duration_ms = started.elapsed().as_millis() as u64,
                "Challenge stored"
            );
            RunOutcome::Succeeded {
                result: record.into(),
                attempts: attempt,
            }
        }
        Err(err) => {
            // Text was generated but not stored; surfaced as a failure
            warn!(user_id = %user_id, error = %err, "Persisting challenge failed");
            RunOutcome::failed(user_id, FailureKind::Persistence, err.to_string(), attempt)
        }
    }
}

fn transition(user_id: &str, state: UnitState) {
    debug!(
        user_id,
        state = ?state,
        terminal = state.is_terminal(),
        "Unit state changed"
    );
}

fn cancelled(user_id: &str, attempts: u32) -> RunOutcome {
    info!(user_id, attempts, "Unit cancelled");
    RunOutcome::failed(user_id, FailureKind::Cancelled, "run cancelled", attempts)
}

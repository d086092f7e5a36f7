//! End-to-end batch runs against in-memory fakes.

use super::test_utils::*;
use challenge_factory::batch::{BatchCoordinator, FailureKind, RunOutcome, RunScope};
use challenge_factory::error::{ApiError, GenerationError};
use challenge_factory::store::{MemoryResultStore, ResultStore};
use challenge_factory::types::UserProfile;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn ana() -> UserProfile {
    UserProfile::new("u1", "Ana")
        .with_attribute("hábito", "lee mucho")
        .with_attribute("rutina", "madruga")
}

#[tokio::test]
async fn valid_profile_succeeds_and_nameless_profile_is_skipped() {
    let client = Arc::new(ScriptedClient::new());
    let store = Arc::new(MemoryResultStore::new());
    let coordinator = coordinator(
        vec![ana(), UserProfile::new("u2", "")],
        client.clone(),
        store.clone(),
        fast_config(10),
    );

    let report = coordinator
        .run(RunScope::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.counts.total, 2);
    assert_eq!(report.counts.succeeded, 1);
    assert_eq!(report.counts.skipped, 1);
    assert!(matches!(
        report.outcome_for("u1"),
        Some(RunOutcome::Succeeded { attempts: 1, .. })
    ));
    assert_eq!(
        report.outcome_for("u2"),
        Some(&RunOutcome::skipped("u2", "missing identity"))
    );
    assert!(!report.cancelled);
    assert!(report.finished_at.is_some());

    // Skipped profiles never reach the client or the store
    assert_eq!(client.total_calls(), 1);
    assert_eq!(store.write_count(), 1);
    let stored = store.get("u1").await.unwrap().unwrap();
    assert_eq!(stored.display_name, "Ana");
    assert!(stored.challenge_text.as_str().contains("u1"));

    let prompt = &client.prompts()[0];
    assert!(prompt.contains("Ana"));
    assert!(prompt.contains("lee mucho"));
    assert!(prompt.contains("madruga"));
    assert!(!prompt.contains("u1"));
}

#[tokio::test]
async fn rate_limits_are_retried_until_success() {
    let client = Arc::new(ScriptedClient::new().script(
        "u1",
        vec![
            Err(GenerationError::RateLimited("slow down".to_string())),
            Err(GenerationError::RateLimited("slow down".to_string())),
            Ok("Camina 15 minutos al amanecer.".to_string()),
        ],
    ));
    let store = Arc::new(MemoryResultStore::new());
    let coordinator = coordinator(vec![ana()], client.clone(), store.clone(), fast_config(1));

    let report = coordinator
        .run(RunScope::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(client.calls_for("u1"), 3);
    match report.outcome_for("u1") {
        Some(RunOutcome::Succeeded { result, attempts }) => {
            assert_eq!(*attempts, 3);
            assert_eq!(result.challenge_text.as_str(), "Camina 15 minutos al amanecer.");
            assert!(result.processed_at.is_some());
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn retries_stop_at_the_configured_attempts() {
    let client = Arc::new(ScriptedClient::new().script(
        "u1",
        vec![
            Err(GenerationError::ServiceError {
                code: 503,
                message: "overloaded".to_string(),
            });
            5
        ],
    ));
    let store = Arc::new(MemoryResultStore::new());
    let coordinator = coordinator(vec![ana()], client.clone(), store.clone(), fast_config(1));

    let report = coordinator
        .run(RunScope::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(client.calls_for("u1"), 3);
    assert!(matches!(
        report.outcome_for("u1"),
        Some(RunOutcome::Failed {
            kind: FailureKind::ServiceError,
            attempts: 3,
            ..
        })
    ));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn empty_response_is_never_a_success() {
    let client = Arc::new(
        ScriptedClient::new().script("u1", vec![Ok("   \n ".to_string())]),
    );
    let store = Arc::new(MemoryResultStore::new());
    let coordinator = coordinator(vec![ana()], client.clone(), store.clone(), fast_config(1));

    let report = coordinator
        .run(RunScope::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        report.outcome_for("u1").and_then(|o| o.failure_kind()),
        Some(FailureKind::EmptyResponse)
    );
    assert_eq!(client.calls_for("u1"), 1, "empty responses are not retried");
    assert!(store.get("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn concurrency_never_exceeds_the_limit() {
    let probe = Arc::new(ConcurrencyProbe::new(Duration::from_millis(20)));
    let users = (0..12)
        .map(|i| UserProfile::new(format!("user-{i:02}"), format!("Persona {i}")))
        .collect();
    let store = Arc::new(MemoryResultStore::new());
    let coordinator = coordinator(users, probe.clone(), store.clone(), fast_config(3));

    let report = coordinator
        .run(RunScope::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.counts.succeeded, 12);
    assert!(probe.max_in_flight() <= 3);
    assert!(probe.max_in_flight() >= 2, "units should overlap");
    assert_eq!(store.write_count(), 12);
}

#[tokio::test]
async fn no_users_means_no_calls() {
    let client = Arc::new(ScriptedClient::new());
    let store = Arc::new(MemoryResultStore::new());
    let coordinator = coordinator(Vec::new(), client.clone(), store.clone(), fast_config(4));

    let report = coordinator
        .run(RunScope::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.counts.total, 0);
    assert!(report.outcomes.is_empty());
    assert_eq!(report.success_rate(), 0.0);
    assert_eq!(client.total_calls(), 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn failing_store_only_fails_that_user() {
    let client = Arc::new(ScriptedClient::new());
    let store = Arc::new(FailingStore::new(&["u2"]));
    let coordinator = coordinator(
        vec![ana(), UserProfile::new("u2", "Luis")],
        client,
        store.clone(),
        fast_config(2),
    );

    let report = coordinator
        .run(RunScope::All, CancellationToken::new())
        .await
        .unwrap();

    assert!(report.outcome_for("u1").unwrap().is_success());
    assert_eq!(
        report.outcome_for("u2").and_then(|o| o.failure_kind()),
        Some(FailureKind::Persistence)
    );
    assert!(store.get("u1").await.unwrap().is_some());
}

#[tokio::test]
async fn panicking_unit_is_reported_as_internal() {
    let client = Arc::new(PanickingClient {
        user_id: "u2".to_string(),
    });
    let store = Arc::new(MemoryResultStore::new());
    let coordinator = coordinator(
        vec![ana(), UserProfile::new("u2", "Luis")],
        client,
        store,
        fast_config(2),
    );

    let report = coordinator
        .run(RunScope::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.counts.total, 2);
    assert!(report.outcome_for("u1").unwrap().is_success());
    assert_eq!(
        report.outcome_for("u2").and_then(|o| o.failure_kind()),
        Some(FailureKind::Internal)
    );
}

#[tokio::test]
async fn unavailable_source_aborts_the_run() {
    let coordinator = BatchCoordinator::new(
        Arc::new(UnavailableSource),
        builder(),
        Arc::new(ScriptedClient::new()),
        Arc::new(MemoryResultStore::new()),
        fast_config(2),
    );

    let err = coordinator
        .run(RunScope::All, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::SourceUnavailable(_)));
}

#[tokio::test]
async fn cancellation_yields_partial_report() {
    let users = (0..4)
        .map(|i| UserProfile::new(format!("u{i}"), format!("Persona {i}")))
        .collect();
    let store = Arc::new(MemoryResultStore::new());
    let coordinator = coordinator(users, Arc::new(HangingClient), store.clone(), fast_config(1));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(10), coordinator.run(RunScope::All, cancel))
        .await
        .expect("run should stop promptly after cancellation")
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.counts.total, 4);
    assert_eq!(report.counts.failed, 4);
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.failure_kind() == Some(FailureKind::Cancelled)));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn run_deadline_cancels_the_run() {
    let mut config = fast_config(2);
    config.run_deadline_secs = Some(1);
    let coordinator = coordinator(
        vec![ana(), UserProfile::new("u2", "Luis")],
        Arc::new(HangingClient),
        Arc::new(MemoryResultStore::new()),
        config,
    );

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        coordinator.run(RunScope::All, CancellationToken::new()),
    )
    .await
    .expect("deadline should stop the run")
    .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.counts.failed, 2);
}

#[tokio::test]
async fn scoped_run_touches_only_that_user() {
    let client = Arc::new(ScriptedClient::new());
    let store = Arc::new(MemoryResultStore::new());
    let coordinator = coordinator(
        vec![ana(), UserProfile::new("u2", "Luis")],
        client.clone(),
        store.clone(),
        fast_config(2),
    );

    let report = coordinator
        .run(RunScope::User("u2".to_string()), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.counts.total, 1);
    assert!(report.outcome_for("u2").unwrap().is_success());
    assert_eq!(client.calls_for("u1"), 0);
    assert!(store.get("u1").await.unwrap().is_none());

    let missing = coordinator
        .run(RunScope::User("ghost".to_string()), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        missing.outcome_for("ghost"),
        Some(&RunOutcome::skipped("ghost", "user not found"))
    );
}

#[tokio::test]
async fn duplicate_ids_are_processed_once() {
    let client = Arc::new(ScriptedClient::new());
    let store = Arc::new(MemoryResultStore::new());
    let coordinator = coordinator(
        vec![ana(), UserProfile::new("u1", "Ana bis")],
        client.clone(),
        store.clone(),
        fast_config(2),
    );

    let report = coordinator
        .run(RunScope::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.counts.total, 2);
    assert_eq!(report.counts.succeeded, 1);
    assert_eq!(report.counts.skipped, 1);
    assert_eq!(client.calls_for("u1"), 1);
    assert_eq!(store.get("u1").await.unwrap().unwrap().display_name, "Ana");
}

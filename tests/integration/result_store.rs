//! Sled-backed persistence across runs.

use super::test_utils::*;
use challenge_factory::batch::{BatchCoordinator, RunScope};
use challenge_factory::store::{open_database, ResultStore, RunReportStore, SledResultStore};
use challenge_factory::types::UserProfile;
use challenge_factory::users::SledUserSource;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn second_run_replaces_the_first_runs_artifacts() {
    let dir = TempDir::new().unwrap();
    let db = open_database(dir.path().join("store")).unwrap();

    let users = SledUserSource::new(&db).unwrap();
    users
        .import(&[UserProfile::new("u1", "Ana"), UserProfile::new("u2", "Luis")])
        .unwrap();
    let users = Arc::new(users);
    let results = Arc::new(SledResultStore::new(&db).unwrap());
    let runs = RunReportStore::new(&db).unwrap();

    let first_client = Arc::new(
        ScriptedClient::new()
            .script("u1", vec![Ok("Primer reto de Ana".to_string())])
            .script("u2", vec![Ok("Primer reto de Luis".to_string())]),
    );
    let first = BatchCoordinator::new(
        users.clone(),
        builder(),
        first_client,
        results.clone(),
        fast_config(2),
    )
    .run(RunScope::All, CancellationToken::new())
    .await
    .unwrap();
    runs.put(&first).unwrap();
    let first_u1 = results.get("u1").await.unwrap().unwrap();

    let second_client = Arc::new(
        ScriptedClient::new().script("u1", vec![Ok("Segundo reto de Ana".to_string())]),
    );
    let second = BatchCoordinator::new(
        users,
        builder(),
        second_client,
        results.clone(),
        fast_config(2),
    )
    .run(RunScope::User("u1".to_string()), CancellationToken::new())
    .await
    .unwrap();
    runs.put(&second).unwrap();

    let records = results.list().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].user_id, "u1");
    assert_eq!(records[0].challenge_text.as_str(), "Segundo reto de Ana");
    assert!(records[0].processed_at >= first_u1.processed_at);
    assert_eq!(records[1].challenge_text.as_str(), "Primer reto de Luis");

    assert_eq!(runs.latest().unwrap().unwrap().run_id, second.run_id);
    assert_eq!(runs.get(&first.run_id).unwrap().unwrap().counts.succeeded, 2);
}

#[tokio::test]
async fn artifacts_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store");
    {
        let db = open_database(&path).unwrap();
        let store = SledResultStore::new(&db).unwrap();
        let client = Arc::new(ScriptedClient::new());
        let report = coordinator(
            vec![UserProfile::new("u1", "Ana")],
            client,
            Arc::new(SledResultStore::new(&db).unwrap()),
            fast_config(1),
        )
        .run(RunScope::All, CancellationToken::new())
        .await
        .unwrap();
        assert_eq!(report.counts.succeeded, 1);
        assert!(store.get("u1").await.unwrap().is_some());
    }

    let db = open_database(&path).unwrap();
    let store = SledResultStore::new(&db).unwrap();
    let record = store.get("u1").await.unwrap().unwrap();
    assert_eq!(record.display_name, "Ana");
}

//! Every user in the snapshot gets exactly one outcome

use async_trait::async_trait;
use challenge_factory::batch::{BatchConfig, BatchCoordinator, RunScope};
use challenge_factory::error::GenerationError;
use challenge_factory::generation::GenerationClient;
use challenge_factory::prompt::{PromptBuilder, PromptTemplate};
use challenge_factory::store::MemoryResultStore;
use challenge_factory::types::{ChallengeText, GenerationRequest, UserProfile};
use challenge_factory::users::MemoryUserSource;
use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fails deterministically for ids ending in an odd digit
struct ParityClient;

#[async_trait]
impl GenerationClient for ParityClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<ChallengeText, GenerationError> {
        let odd = request
            .user_id()
            .chars()
            .last()
            .and_then(|c| c.to_digit(10))
            .map(|d| d % 2 == 1)
            .unwrap_or(false);
        if odd {
            Err(GenerationError::ServiceError {
                code: 400,
                message: "rejected".to_string(),
            })
        } else {
            Ok(ChallengeText::parse("Bebe un vaso de agua al despertar.").unwrap())
        }
    }
}

fn users_strategy() -> impl Strategy<Value = Vec<UserProfile>> {
    prop::collection::vec(("[a-c][0-9]", prop::bool::weighted(0.8)), 0..16).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, named)| UserProfile::new(id, if named { "Ana" } else { "" }))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn outcome_count_matches_snapshot(users in users_strategy(), limit in 1usize..5) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let store = Arc::new(MemoryResultStore::new());
        let coordinator = BatchCoordinator::new(
            Arc::new(MemoryUserSource::new(users.clone())),
            PromptBuilder::new(
                PromptTemplate::builtin("es").unwrap(),
                15,
                NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            ),
            Arc::new(ParityClient),
            store.clone(),
            BatchConfig {
                max_concurrent_users: limit,
                ..BatchConfig::default()
            },
        );

        let report = runtime
            .block_on(coordinator.run(RunScope::All, CancellationToken::new()))
            .unwrap();

        prop_assert_eq!(report.counts.total, users.len());
        prop_assert_eq!(report.outcomes.len(), users.len());
        prop_assert_eq!(
            report.counts.succeeded + report.counts.skipped + report.counts.failed,
            report.counts.total
        );

        let unique: HashSet<&str> = users.iter().map(|u| u.user_id.as_str()).collect();
        prop_assert_eq!(store.write_count(), report.counts.succeeded);
        prop_assert!(report.counts.succeeded <= unique.len());
        prop_assert!(!report.cancelled);
    }
}

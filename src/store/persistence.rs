//! Sled-backed artifact and run report storage

use crate::batch::RunReport;
use crate::error::{to_store_unavailable, StoreError};
use crate::store::ResultStore;
use crate::types::{ArtifactRecord, GenerationResult};
use async_trait::async_trait;
use chrono::Utc;
use sled::{Db, Tree};
use tracing::warn;

const TREE_ARTIFACTS: &str = "artifacts";
const TREE_RUNS: &str = "runs";
const MAX_CAS_ATTEMPTS: usize = 3;

/// Sled-based implementation of ResultStore
#[derive(Clone)]
pub struct SledResultStore {
    artifacts: Tree,
}

impl SledResultStore {
    pub fn new(db: &Db) -> Result<Self, StoreError> {
        let artifacts = db.open_tree(TREE_ARTIFACTS).map_err(to_store_unavailable)?;
        Ok(Self { artifacts })
    }

    fn decode(value: &[u8]) -> Result<ArtifactRecord, StoreError> {
        bincode::deserialize(value)
            .map_err(|e| StoreError::Corrupt(format!("Failed to deserialize artifact: {}", e)))
    }
}

#[async_trait]
impl ResultStore for SledResultStore {
    async fn upsert(
        &self,
        user_id: &str,
        result: &GenerationResult,
    ) -> Result<ArtifactRecord, StoreError> {
        let key = user_id.as_bytes();

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = self.artifacts.get(key).map_err(to_store_unavailable)?;
            let record = ArtifactRecord::from_result(result, Utc::now());
            let value = bincode::serialize(&record)
                .map_err(|e| StoreError::Corrupt(format!("Failed to serialize artifact: {}", e)))?;

            match self
                .artifacts
                .compare_and_swap(key, current, Some(value))
                .map_err(to_store_unavailable)?
            {
                Ok(()) => {
                    self.artifacts.flush().map_err(to_store_unavailable)?;
                    return Ok(record);
                }
                Err(_) => {
                    warn!(user_id, attempt, "Artifact changed during write, retrying");
                }
            }
        }

        Err(StoreError::WriteConflict {
            user_id: user_id.to_string(),
        })
    }

    async fn get(&self, user_id: &str) -> Result<Option<ArtifactRecord>, StoreError> {
        match self
            .artifacts
            .get(user_id.as_bytes())
            .map_err(to_store_unavailable)?
        {
            Some(value) => Ok(Some(Self::decode(&value)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<ArtifactRecord>, StoreError> {
        let mut records = Vec::new();
        for item in self.artifacts.iter() {
            let (_, value) = item.map_err(to_store_unavailable)?;
            records.push(Self::decode(&value)?);
        }
        Ok(records)
    }
}

/// Run reports keyed by run id; run ids sort by start time
#[derive(Clone)]
pub struct RunReportStore {
    runs: Tree,
}

impl RunReportStore {
    pub fn new(db: &Db) -> Result<Self, StoreError> {
        let runs = db.open_tree(TREE_RUNS).map_err(to_store_unavailable)?;
        Ok(Self { runs })
    }

    pub fn put(&self, report: &RunReport) -> Result<(), StoreError> {
        let value = serde_json::to_vec(report).map_err(to_store_data)?;
        self.runs
            .insert(report.run_id.as_bytes(), value)
            .map_err(to_store_unavailable)?;
        self.runs.flush().map_err(to_store_unavailable)?;
        Ok(())
    }

    pub fn get(&self, run_id: &str) -> Result<Option<RunReport>, StoreError> {
        match self
            .runs
            .get(run_id.as_bytes())
            .map_err(to_store_unavailable)?
        {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw).map_err(to_store_data)?)),
            None => Ok(None),
        }
    }

    pub fn latest(&self) -> Result<Option<RunReport>, StoreError> {
        match self.runs.last().map_err(to_store_unavailable)? {
            Some((_, raw)) => Ok(Some(serde_json::from_slice(&raw).map_err(to_store_data)?)),
            None => Ok(None),
        }
    }
}

fn to_store_data(err: serde_json::Error) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

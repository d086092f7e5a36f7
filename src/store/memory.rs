//! In-memory result store for dry runs and tests

use crate::error::StoreError;
use crate::store::ResultStore;
use crate::types::{ArtifactRecord, GenerationResult};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct MemoryResultStore {
    records: RwLock<BTreeMap<String, ArtifactRecord>>,
    writes: AtomicUsize,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful upserts so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn upsert(
        &self,
        user_id: &str,
        result: &GenerationResult,
    ) -> Result<ArtifactRecord, StoreError> {
        let record = ArtifactRecord::from_result(result, Utc::now());
        self.records
            .write()
            .insert(user_id.to_string(), record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    async fn get(&self, user_id: &str) -> Result<Option<ArtifactRecord>, StoreError> {
        Ok(self.records.read().get(user_id).cloned())
    }

    async fn list(&self) -> Result<Vec<ArtifactRecord>, StoreError> {
        Ok(self.records.read().values().cloned().collect())
    }
}

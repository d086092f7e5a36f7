//! Result Store
//!
//! One artifact per user, keyed by user id. Every write is a full replace and stamps
//! `processed_at` at write time. Run reports share the same sled database.

pub mod memory;
pub mod persistence;

pub use memory::MemoryResultStore;
pub use persistence::{RunReportStore, SledResultStore};

use crate::error::{to_store_unavailable, StoreError};
use crate::types::{ArtifactRecord, GenerationResult};
use async_trait::async_trait;
use std::path::Path;

/// Result store interface
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Replace whatever is stored for `user_id` with `result`.
    ///
    /// Returns the stored record, including the assigned `processed_at`.
    async fn upsert(
        &self,
        user_id: &str,
        result: &GenerationResult,
    ) -> Result<ArtifactRecord, StoreError>;

    async fn get(&self, user_id: &str) -> Result<Option<ArtifactRecord>, StoreError>;

    /// All stored records, ordered by user id.
    async fn list(&self) -> Result<Vec<ArtifactRecord>, StoreError>;
}

/// Open (or create) the sled database backing users, artifacts and run reports.
pub fn open_database<P: AsRef<Path>>(path: P) -> Result<sled::Db, StoreError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            StoreError::Unavailable(format!(
                "Failed to create store directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    sled::open(path).map_err(to_store_unavailable)
}

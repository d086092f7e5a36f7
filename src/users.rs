//! User Sources
//!
//! A user source yields the snapshot of registered users a run works through. An empty
//! snapshot is a normal result; only an unreachable source is an error.

use crate::error::SourceError;
use crate::types::UserProfile;
use async_trait::async_trait;

pub mod file_source;
pub mod sled_source;

pub use file_source::JsonFileUserSource;
pub use sled_source::SledUserSource;

/// User source interface
#[async_trait]
pub trait UserSource: Send + Sync {
    /// Every user registered at call time.
    async fn fetch_all(&self) -> Result<Vec<UserProfile>, SourceError>;

    /// A single user, for runs scoped to one id.
    async fn fetch_one(&self, user_id: &str) -> Result<Option<UserProfile>, SourceError> {
        Ok(self
            .fetch_all()
            .await?
            .into_iter()
            .find(|profile| profile.user_id == user_id))
    }
}

/// Fixed in-memory snapshot
#[derive(Debug, Clone, Default)]
pub struct MemoryUserSource {
    profiles: Vec<UserProfile>,
}

impl MemoryUserSource {
    pub fn new(profiles: Vec<UserProfile>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl UserSource for MemoryUserSource {
    async fn fetch_all(&self) -> Result<Vec<UserProfile>, SourceError> {
        Ok(self.profiles.clone())
    }
}

//! Users tree in the factory's sled database (JSON values).

use crate::error::SourceError;
use crate::types::UserProfile;
use crate::users::UserSource;
use async_trait::async_trait;
use sled::{Db, Tree};

const TREE_USERS: &str = "users";

#[derive(Clone)]
pub struct SledUserSource {
    users: Tree,
}

impl SledUserSource {
    pub fn new(db: &Db) -> Result<Self, SourceError> {
        let users = db.open_tree(TREE_USERS).map_err(to_source_unavailable)?;
        Ok(Self { users })
    }

    /// Insert or replace one profile.
    pub fn put(&self, profile: &UserProfile) -> Result<(), SourceError> {
        let value = serde_json::to_vec(profile).map_err(|e| SourceError::Corrupt {
            user_id: profile.user_id.clone(),
            message: e.to_string(),
        })?;
        self.users
            .insert(profile.user_id.as_bytes(), value)
            .map_err(to_source_unavailable)?;
        Ok(())
    }

    /// Insert or replace a batch of profiles; returns how many were written.
    pub fn import(&self, profiles: &[UserProfile]) -> Result<usize, SourceError> {
        for profile in profiles {
            self.put(profile)?;
        }
        self.users.flush().map_err(to_source_unavailable)?;
        Ok(profiles.len())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn decode(key: &[u8], value: &[u8]) -> Result<UserProfile, SourceError> {
        serde_json::from_slice(value).map_err(|e| SourceError::Corrupt {
            user_id: String::from_utf8_lossy(key).into_owned(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl UserSource for SledUserSource {
    async fn fetch_all(&self) -> Result<Vec<UserProfile>, SourceError> {
        let mut profiles = Vec::new();
        for item in self.users.iter() {
            let (key, value) = item.map_err(to_source_unavailable)?;
            profiles.push(Self::decode(&key, &value)?);
        }
        Ok(profiles)
    }

    async fn fetch_one(&self, user_id: &str) -> Result<Option<UserProfile>, SourceError> {
        match self
            .users
            .get(user_id.as_bytes())
            .map_err(to_source_unavailable)?
        {
            Some(value) => Ok(Some(Self::decode(user_id.as_bytes(), &value)?)),
            None => Ok(None),
        }
    }
}

fn to_source_unavailable(err: sled::Error) -> SourceError {
    SourceError::Unavailable(err.to_string())
}

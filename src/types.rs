//! Core data model: user profiles, generation requests and results, stored artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named free-text profile fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAttribute {
    pub name: String,
    pub value: String,
}

impl ProfileAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Read-only snapshot of a registered user, taken once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    /// Ordered profile facts; order is preserved into the rendered prompt.
    #[serde(default)]
    pub attributes: Vec<ProfileAttribute>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(ProfileAttribute::new(name, value));
        self
    }

    /// True when both identity fields are present.
    pub fn has_identity(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.display_name.trim().is_empty()
    }
}

/// A rendered prompt bound to the user it was built for.
///
/// Only `prompt` crosses the provider boundary; `user_id` stays local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    user_id: String,
    prompt: String,
}

impl GenerationRequest {
    pub fn new(user_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            prompt: prompt.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Trimmed, non-empty challenge text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeText(String);

impl ChallengeText {
    /// Trim `raw`; `None` when nothing remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChallengeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a successful generation, before and after persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub user_id: String,
    pub display_name: String,
    pub challenge_text: ChallengeText,
    /// Stamped by the pipeline when the text came back.
    pub created_at: DateTime<Utc>,
    /// Assigned by the result store at write time.
    pub processed_at: Option<DateTime<Utc>>,
}

impl GenerationResult {
    pub fn new(profile: &UserProfile, challenge_text: ChallengeText, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id: profile.user_id.clone(),
            display_name: profile.display_name.clone(),
            challenge_text,
            created_at,
            processed_at: None,
        }
    }
}

/// Stored form of a result; one per user, replaced wholesale on every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub user_id: String,
    pub display_name: String,
    pub challenge_text: ChallengeText,
    pub created_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

impl ArtifactRecord {
    pub fn from_result(result: &GenerationResult, processed_at: DateTime<Utc>) -> Self {
        Self {
            user_id: result.user_id.clone(),
            display_name: result.display_name.clone(),
            challenge_text: result.challenge_text.clone(),
            created_at: result.created_at,
            processed_at,
        }
    }
}

impl From<ArtifactRecord> for GenerationResult {
    fn from(record: ArtifactRecord) -> Self {
        Self {
            user_id: record.user_id,
            display_name: record.display_name,
            challenge_text: record.challenge_text,
            created_at: record.created_at,
            processed_at: Some(record.processed_at),
        }
    }
}

//! Prompt Building
//!
//! Renders one generation request per user profile. Building is pure: the run date,
//! time bound and template are fixed when the builder is constructed, so the same
//! profile always renders to the same prompt within a run.

use crate::error::ApiError;
use crate::types::{GenerationRequest, UserProfile};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod template;

pub use template::{AttributeLabels, PromptTemplate};

use template::{
    PLACEHOLDER_ATTRIBUTES, PLACEHOLDER_DATE, PLACEHOLDER_DISPLAY_NAME, PLACEHOLDER_TIME_BOUND,
};

pub const SKIP_MISSING_IDENTITY: &str = "missing identity";

/// Prompt section of the factory config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Custom template file; relative paths resolve against the workspace
    #[serde(default)]
    pub template_path: Option<PathBuf>,

    /// Upper bound, in minutes, the challenge must fit in
    #[serde(default = "default_time_bound")]
    pub time_bound_minutes: u32,

    /// Language of the built-in template and fixed labels: es, en
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_time_bound() -> u32 {
    15
}

fn default_language() -> String {
    "es".to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template_path: None,
            time_bound_minutes: default_time_bound(),
            language: default_language(),
        }
    }
}

impl PromptConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.time_bound_minutes == 0 {
            return Err("time_bound_minutes must be at least 1".to_string());
        }
        if self.template_path.is_none() && PromptTemplate::builtin(&self.language).is_none() {
            return Err(format!(
                "No built-in template for language '{}' (supported: es, en)",
                self.language
            ));
        }
        Ok(())
    }
}

/// Result of building a prompt for one profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Request(GenerationRequest),
    Skip(String),
}

/// Deterministic prompt renderer
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: PromptTemplate,
    labels: AttributeLabels,
    time_bound_minutes: u32,
    run_date: NaiveDate,
}

impl PromptBuilder {
    pub fn new(template: PromptTemplate, time_bound_minutes: u32, run_date: NaiveDate) -> Self {
        Self {
            template,
            labels: AttributeLabels::for_language("es"),
            time_bound_minutes,
            run_date,
        }
    }

    pub fn with_labels(mut self, labels: AttributeLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Build from config, loading a custom template when one is configured.
    pub fn from_config(
        config: &PromptConfig,
        workspace_root: &Path,
        run_date: NaiveDate,
    ) -> Result<Self, ApiError> {
        let template = match &config.template_path {
            Some(path) if path.is_absolute() => PromptTemplate::from_file(path)?,
            Some(path) => PromptTemplate::from_file(&workspace_root.join(path))?,
            None => PromptTemplate::builtin(&config.language).ok_or_else(|| {
                ApiError::TemplateError(format!(
                    "No built-in template for language '{}'",
                    config.language
                ))
            })?,
        };
        Ok(Self::new(template, config.time_bound_minutes, run_date)
            .with_labels(AttributeLabels::for_language(&config.language)))
    }

    pub fn run_date(&self) -> NaiveDate {
        self.run_date
    }

    pub fn build(&self, profile: &UserProfile) -> PromptOutcome {
        if !profile.has_identity() {
            return PromptOutcome::Skip(SKIP_MISSING_IDENTITY.to_string());
        }

        let mut values = HashMap::new();
        values.insert(PLACEHOLDER_DISPLAY_NAME, profile.display_name.trim().to_string());
        values.insert(PLACEHOLDER_ATTRIBUTES, self.render_attributes(profile));
        values.insert(PLACEHOLDER_TIME_BOUND, self.time_bound_minutes.to_string());
        values.insert(PLACEHOLDER_DATE, self.run_date.format("%Y-%m-%d").to_string());

        PromptOutcome::Request(GenerationRequest::new(
            profile.user_id.clone(),
            self.template.render(&values),
        ))
    }

    fn render_attributes(&self, profile: &UserProfile) -> String {
        if profile.attributes.is_empty() {
            return self.labels.no_attributes.clone();
        }
        profile
            .attributes
            .iter()
            .map(|attr| {
                let value = attr.value.trim();
                let value = if value.is_empty() {
                    self.labels.empty_value.as_str()
                } else {
                    value
                };
                format!("- {}: {}", attr.name.trim(), value)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

//! Challenge Factory: Daily Challenge Batch Generation
//!
//! Generates one personalized daily challenge per registered user with an LLM provider,
//! under a fixed concurrency limit, isolating failures per user and persisting exactly
//! one artifact per user per run.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod prompt;
pub mod provider;
pub mod store;
pub mod types;
pub mod users;

//! Integration tests for the challenge factory

mod batch_pipeline;
mod config_integration;
mod result_store;
mod test_utils;

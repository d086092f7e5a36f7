//! Property-based tests for run accounting and prompt rendering

mod prompt_rendering;
mod run_accounting;

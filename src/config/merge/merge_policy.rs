//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; tables are merged, not replaced.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("batch.max_concurrent_users", 10)?
        .set_default("batch.generation_timeout_secs", 60)?
        .set_default("batch.retry_attempts", 3)?
        .set_default("batch.retry_base_delay_ms", 500)?
        .set_default("batch.retry_max_delay_ms", 8000)?
        .set_default("storage.store_path", ".challenge-factory/store")
}

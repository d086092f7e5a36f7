//! Integration tests for the configuration system

use challenge_factory::config::{ConfigLoader, ProviderType};
use challenge_factory::prompt::{PromptBuilder, PromptOutcome};
use challenge_factory::types::UserProfile;
use chrono::NaiveDate;
use tempfile::TempDir;

#[test]
fn test_full_config_file_drives_every_section() {
    let temp_dir = TempDir::new().unwrap();
    let template = temp_dir.path().join("prompt.txt");
    std::fs::write(
        &template,
        "Reto para {display_name} ({date}), máximo {time_bound} min.\n{attributes}",
    )
    .unwrap();

    let config_file = temp_dir.path().join("factory.toml");
    std::fs::write(
        &config_file,
        format!(
            r#"
[batch]
max_concurrent_users = 5
generation_timeout_secs = 30
retry_attempts = 2
run_deadline_secs = 600

[provider]
provider_type = "anthropic"
model = "claude-3-5-haiku-latest"
api_key = "test-key"

[provider.default_options]
temperature = 0.7
max_tokens = 300

[prompt]
template_path = "{}"
time_bound_minutes = 20

[storage]
store_path = "data/store"

[logging]
level = "debug"
format = "json"
"#,
            template.display()
        ),
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.batch.max_concurrent_users, 5);
    assert_eq!(config.batch.run_deadline_secs, Some(600));
    assert_eq!(config.batch.retry_policy().max_attempts, 2);
    assert_eq!(config.provider.provider_type, ProviderType::Anthropic);
    assert_eq!(config.provider.default_options.max_tokens, Some(300));
    assert_eq!(config.logging.format, "json");
    assert_eq!(
        config.storage.resolve_store_path(temp_dir.path()).unwrap(),
        temp_dir.path().join("data/store")
    );

    let builder = PromptBuilder::from_config(
        &config.prompt,
        temp_dir.path(),
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
    )
    .unwrap();
    match builder.build(&UserProfile::new("u1", "Ana")) {
        PromptOutcome::Request(request) => {
            assert!(request
                .prompt()
                .starts_with("Reto para Ana (2026-10-16), máximo 20 min."));
        }
        PromptOutcome::Skip(reason) => panic!("unexpected skip: {}", reason),
    }
}

#[test]
fn test_invalid_values_fail_validation() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("factory.toml");
    std::fs::write(
        &config_file,
        r#"
[batch]
retry_attempts = 0

[prompt]
language = "fr"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    let errors = config.validate().unwrap_err();
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert!(messages.iter().any(|m| m.starts_with("Batch:")));
    assert!(messages.iter().any(|m| m.starts_with("Prompt:")));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml")).is_err());
}

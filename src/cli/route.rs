//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::batch::{BatchCoordinator, RunScope};
use crate::config::{ConfigLoader, FactoryConfig};
use crate::error::ApiError;
use crate::generation::ProviderGenerationClient;
use crate::prompt::PromptBuilder;
use crate::provider::ProviderFactory;
use crate::store::{self, MemoryResultStore, ResultStore, RunReportStore, SledResultStore};
use crate::users::{JsonFileUserSource, SledUserSource, UserSource};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn};

use crate::cli::command_name;
use crate::cli::parse::{ArtifactsCommands, Commands, RunsCommands, UsersCommands};
use crate::cli::presentation::{
    format_artifact, format_artifacts, format_run_report, format_users,
};

/// Runtime context for CLI execution: loaded config, workspace and the open store.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    config: FactoryConfig,
    workspace_root: PathBuf,
    store_path: PathBuf,
    db: sled::Db,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };

        if let Err(errors) = config.validate() {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ApiError::ConfigError(joined));
        }

        let store_path = config.storage.resolve_store_path(&workspace_root)?;
        let db = store::open_database(&store_path)?;

        Ok(Self {
            config,
            workspace_root,
            store_path,
            db,
        })
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let span = info_span!("command", command = %command_name(command));
        let _guard = span.enter();
        match command {
            Commands::Run {
                user,
                dry_run,
                format,
            } => self.handle_run(user.clone(), *dry_run, format),
            Commands::Users { command } => self.handle_users_command(command),
            Commands::Artifacts { command } => self.handle_artifacts_command(command),
            Commands::Runs { command } => self.handle_runs_command(command),
            Commands::Init { force } => self.handle_init(*force),
        }
    }

    fn handle_run(
        &self,
        user: Option<String>,
        dry_run: bool,
        format: &str,
    ) -> Result<String, ApiError> {
        let provider: Arc<dyn crate::provider::ModelProviderClient> =
            Arc::from(ProviderFactory::from_config(&self.config.provider)?);
        info!(
            provider = %self.config.provider.provider_type,
            model = %self.config.provider.model,
            "Provider client ready"
        );
        let client = Arc::new(ProviderGenerationClient::new(
            provider,
            self.config.provider.default_options.clone(),
            self.config.batch.generation_timeout(),
        ));

        let builder = PromptBuilder::from_config(
            &self.config.prompt,
            &self.workspace_root,
            Utc::now().date_naive(),
        )?;
        let source: Arc<dyn UserSource> = Arc::new(SledUserSource::new(&self.db)?);
        let results: Arc<dyn ResultStore> = if dry_run {
            Arc::new(MemoryResultStore::new())
        } else {
            Arc::new(SledResultStore::new(&self.db)?)
        };

        let coordinator =
            BatchCoordinator::new(source, builder, client, results, self.config.batch.clone());
        let scope = match user {
            Some(user_id) => RunScope::User(user_id),
            None => RunScope::All,
        };

        let runtime = new_runtime()?;
        let report = runtime.block_on(async {
            let cancel = CancellationToken::new();
            let interrupt = {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupt received, cancelling run");
                        cancel.cancel();
                    }
                })
            };
            let report = coordinator.run(scope, cancel).await;
            interrupt.abort();
            report
        })?;

        if dry_run {
            info!(run_id = %report.run_id, "Dry run, report not stored");
        } else {
            RunReportStore::new(&self.db)?.put(&report)?;
        }

        format_run_report(&report, format)
    }

    fn handle_users_command(&self, command: &UsersCommands) -> Result<String, ApiError> {
        let users = SledUserSource::new(&self.db)?;
        match command {
            UsersCommands::Import { file } => {
                let path = if file.is_absolute() {
                    file.clone()
                } else {
                    self.workspace_root.join(file)
                };
                let profiles = JsonFileUserSource::new(&path).load()?;
                let imported = users.import(&profiles)?;
                Ok(format!(
                    "Imported {} user(s) from {} ({} registered)",
                    imported,
                    path.display(),
                    users.len()
                ))
            }
            UsersCommands::List { format } => {
                let runtime = new_runtime()?;
                let profiles = runtime.block_on(users.fetch_all())?;
                format_users(&profiles, format)
            }
        }
    }

    fn handle_artifacts_command(&self, command: &ArtifactsCommands) -> Result<String, ApiError> {
        let results = SledResultStore::new(&self.db)?;
        let runtime = new_runtime()?;
        match command {
            ArtifactsCommands::Show { user_id, format } => {
                match runtime.block_on(results.get(user_id))? {
                    Some(record) => format_artifact(&record, format),
                    None => Ok(format!("No challenge stored for user {}", user_id)),
                }
            }
            ArtifactsCommands::List { format } => {
                let records = runtime.block_on(results.list())?;
                format_artifacts(&records, format)
            }
        }
    }

    fn handle_runs_command(&self, command: &RunsCommands) -> Result<String, ApiError> {
        let runs = RunReportStore::new(&self.db)?;
        match command {
            RunsCommands::Latest { format } => match runs.latest()? {
                Some(report) => format_run_report(&report, format),
                None => Ok("No runs recorded yet.".to_string()),
            },
            RunsCommands::Show { run_id, format } => match runs.get(run_id)? {
                Some(report) => format_run_report(&report, format),
                None => Ok(format!("Run not found: {}", run_id)),
            },
        }
    }

    fn handle_init(&self, force: bool) -> Result<String, ApiError> {
        let config_dir = self.workspace_root.join("config");
        let config_file = config_dir.join("config.toml");
        if config_file.exists() && !force {
            return Ok(format!(
                "Config already exists at {} (use --force to overwrite)",
                config_file.display()
            ));
        }

        let content = toml::to_string_pretty(&self.config).map_err(|e| {
            ApiError::ConfigError(format!("Failed to serialize configuration: {}", e))
        })?;
        std::fs::create_dir_all(&config_dir)?;
        std::fs::write(&config_file, content)?;
        info!(path = %config_file.display(), "Configuration written");
        Ok(format!("Wrote {}", config_file.display()))
    }
}

fn new_runtime() -> Result<tokio::runtime::Runtime, ApiError> {
    tokio::runtime::Runtime::new().map_err(ApiError::IoError)
}

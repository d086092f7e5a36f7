//! CLI command-name contract for logging.

use crate::cli::parse::{ArtifactsCommands, Commands, RunsCommands, UsersCommands};

/// Command name string for log spans (e.g. "run", "users.import").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Run { .. } => "run".to_string(),
        Commands::Users { command } => format!("users.{}", users_command_name(command)),
        Commands::Artifacts { command } => {
            format!("artifacts.{}", artifacts_command_name(command))
        }
        Commands::Runs { command } => format!("runs.{}", runs_command_name(command)),
        Commands::Init { .. } => "init".to_string(),
    }
}

fn users_command_name(command: &UsersCommands) -> &'static str {
    match command {
        UsersCommands::Import { .. } => "import",
        UsersCommands::List { .. } => "list",
    }
}

fn artifacts_command_name(command: &ArtifactsCommands) -> &'static str {
    match command {
        ArtifactsCommands::Show { .. } => "show",
        ArtifactsCommands::List { .. } => "list",
    }
}

fn runs_command_name(command: &RunsCommands) -> &'static str {
    match command {
        RunsCommands::Latest { .. } => "latest",
        RunsCommands::Show { .. } => "show",
    }
}

//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{ArtifactsCommands, Cli, Commands, RunsCommands, UsersCommands};
pub use presentation::{
    format_artifact, format_artifacts, format_run_report, format_run_report_text,
    format_section_heading, format_users,
};
pub use route::RunContext;

//! CLI parse: clap types for the challenge factory. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Challenge Factory CLI - personalized daily challenges in batch
#[derive(Parser)]
#[command(name = "challenge-factory")]
#[command(about = "Generate one personalized daily challenge per user with an LLM provider")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate today's challenges
    Run {
        /// Only process this user
        #[arg(long)]
        user: Option<String>,
        /// Generate without storing artifacts or the run report
        #[arg(long)]
        dry_run: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Manage the registered users
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// Inspect stored challenges
    Artifacts {
        #[command(subcommand)]
        command: ArtifactsCommands,
    },
    /// Inspect past run reports
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
    /// Write the effective configuration to config/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// Import (insert or replace) users from a JSON array of profiles
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
    /// List registered users
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum ArtifactsCommands {
    /// Show the stored challenge for one user
    Show {
        user_id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List every stored challenge
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum RunsCommands {
    /// Show the most recent run report
    Latest {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show a run report by id
    Show {
        run_id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

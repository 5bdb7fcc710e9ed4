use std::path::PathBuf;

use clap::{Parser, Subcommand};
use trellis_core::StoreKind;

use crate::cli::{PlanCommands, RunArgs, StepCommands};

/// Command-line interface for the Trellis plan engine
///
/// Trellis keeps multi-step plans with per-step status and notes, persists
/// them in memory, a JSON document or SQLite, and can drive external programs
/// through a plan's steps one by one. `serve` exposes the same operations to
/// AI assistants over MCP (Model Context Protocol).
#[derive(Parser)]
#[command(version, about, name = "trellis")]
pub struct Args {
    /// Storage backend for plans
    #[arg(long, global = true, value_enum, default_value_t = StorageArg::Sqlite)]
    pub storage: StorageArg,

    /// Path of the storage file. Defaults to $XDG_DATA_HOME/trellis/plans.db
    /// (sqlite) or plans.json (json)
    #[arg(long, global = true)]
    pub storage_path: Option<PathBuf>,

    /// Base URL of a remote service that mirrors plan changes
    #[arg(long, global = true, env = "TRELLIS_SYNC_URL")]
    pub sync_url: Option<String>,

    /// Bearer token sent to the remote service
    #[arg(long, global = true, env = "TRELLIS_SYNC_TOKEN", hide_env_values = true)]
    pub sync_token: Option<String>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the Trellis CLI
///
/// - `plan`: create, update, list, show and delete plans
/// - `step`: mark the status and notes of a step
/// - `run`: drive agents through a plan's steps
/// - `serve`: start the MCP server for AI assistant integration
#[derive(Subcommand)]
pub enum Commands {
    /// Manage plans
    #[command(alias = "p")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Manage steps within plans
    #[command(alias = "s")]
    Step {
        #[command(subcommand)]
        command: StepCommands,
    },
    /// Run a plan's remaining steps through agent programs
    #[command(alias = "r")]
    Run(RunArgs),
    /// Start the MCP server
    Serve,
}

/// Storage backend names accepted on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageArg {
    /// Keep plans in memory only
    Memory,
    /// One JSON document
    Json,
    /// Embedded SQLite database
    Sqlite,
}

impl From<StorageArg> for StoreKind {
    fn from(val: StorageArg) -> Self {
        match val {
            StorageArg::Memory => StoreKind::Memory,
            StorageArg::Json => StoreKind::Json,
            StorageArg::Sqlite => StoreKind::Sqlite,
        }
    }
}

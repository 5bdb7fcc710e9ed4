//! Trellis CLI Application
//!
//! Command-line and MCP front-end for the trellis plan engine.

mod agent;
mod args;
mod cli;
mod mcp;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use env_logger::Env;
use log::info;
use mcp::{run_stdio_server, TrellisMcpServer};
use renderer::TerminalRenderer;
use trellis_core::{RegistryBuilder, SyncConfig};
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        storage,
        storage_path,
        sync_url,
        sync_token,
        no_color,
        verbose,
        command,
    } = Args::parse();

    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let sync = sync_url.map(|url| SyncConfig::new(url).with_token(sync_token));
    let registry = RegistryBuilder::new()
        .with_storage(storage.into())
        .with_storage_path(storage_path)
        .with_sync(sync)
        .build()
        .await
        .context("Failed to initialize plan registry")?;

    let renderer = TerminalRenderer::new(!no_color);

    info!("Trellis started with {} storage", registry.store_kind());

    match command {
        Some(Plan { command }) => {
            Cli::new(registry, renderer)
                .handle_plan_command(command)
                .await
        }
        Some(Step { command }) => Cli::new(registry, renderer).handle_step_command(command),
        Some(Run(args)) => Cli::new(registry, renderer).run_plan(args).await,
        Some(Serve) => {
            info!("Starting Trellis MCP server");
            run_stdio_server(TrellisMcpServer::new(registry))
                .await
                .context("MCP server failed")
        }
        None => Cli::new(registry, renderer).list_plans(),
    }
}

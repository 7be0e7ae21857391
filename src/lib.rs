//! stationsync library root.
//! Edge ingestion-and-sync pipeline: MQTT scan events are buffered in an
//! in-process command queue, flushed transactionally to a local SQLite
//! store on one cadence, and reconciled with a remote store on another.

pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod ingest;
pub mod models;
pub mod queue;
pub mod remote;
pub mod utils;
pub mod worker;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub async fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cfg),
        Commands::Run => cli::commands::run::handle(cfg).await,
        Commands::Status => cli::commands::status::handle(cfg),
    }
}

/// Entry point used by main.rs
pub async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // Config is created on `init` and loaded once here; the CLI `--db`
    // flag overrides the configured database path in memory only.
    let mut cfg = match &cli.command {
        Commands::Init => Config::ensure_exists()?,
        _ => Config::load()?,
    };
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    if matches!(cli.command, Commands::Run) {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "stationsync=info".into()),
            )
            .init();
    }

    dispatch(&cli, &cfg).await
}

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "stationsync",
    about = "Edge ingestion and sync pipeline for station check-in/check-out events",
    version
)]
pub struct Cli {
    /// Override the SQLite database path from the config file
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the config directory, config file and local database schema
    Init,

    /// Run the pipeline (MQTT ingestor + persistence and sync workers)
    Run,

    /// Show row counts and the unsynced backlog per table
    Status,
}

//! Aurora Watch - Main Entry Point

use api::{fetch_events, init_logging, run_server, AppConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "aurora-watch", version, about = "Geomagnetic storm tracker and aurora forecaster")]
struct Cli {
    /// Configuration file (defaults to ./aurora-watch.toml when present)
    #[arg(short, long, env = "AURORA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Check the Kp feed once and record a storm event if one is detected
    FetchEvents,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging);

    info!("=== Aurora Watch v{} ===", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await?,
        Command::FetchEvents => fetch_events(&config).await?,
    }

    Ok(())
}

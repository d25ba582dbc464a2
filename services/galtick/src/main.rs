//! Galtick CLI
//!
//! Command-line interface for the galaxy tick watcher.

use std::path::PathBuf;

use clap::Parser;
use galtick::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "galtick")]
#[command(about = "Elite Dangerous galaxy tick watcher with Discord notifications")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    // A missing .env is fine; the variables may come from the real environment
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    tracing::debug!(
        "Parsed command line arguments: config={:?}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.dashboard_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Err(e) = config.resolve_secrets() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    tracing::info!("Starting galtick service");
    tracing::debug!(
        "Endpoint: {}, polling every {}",
        config.monitor.endpoint,
        humantime::format_duration(config.monitor.polling_interval)
    );

    galtick::run(config).await?;

    Ok(())
}

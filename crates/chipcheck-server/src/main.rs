//! Chipcheck server - streams agent logs into a live view model.

use anyhow::Result;
use chipcheck_core::replay_file;
use chipcheck_server::{build_router, config, logging, state};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use logging::{LogConfig, LogFormat};
use state::AppState;

/// Chipcheck server - reduces agent SDK stream logs for the verification UI.
#[derive(Parser, Debug)]
#[command(name = "chipcheck-server")]
#[command(about = "HTTP server and offline replayer for chip verification agent streams")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Replay a complete log file, print the result and exit
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// With --replay, print the snapshot as JSON instead of formatted text
    #[arg(long, requires = "replay")]
    json: bool,

    /// Enable verbose logging (INFO level for most targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "extractor=debug" or "tables=trace").
    /// Can be specified multiple times. Targets are prefixed with "chipcheck::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(path) = &cli.replay {
        let outcome = replay_file(path, config.reducer)?;
        if cli.json {
            println!("{}", outcome.to_json_pretty()?);
        } else {
            println!("{}", outcome.formatted_output);
        }
        return Ok(());
    }

    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing::info!(
        target: "chipcheck::startup",
        "Loaded configuration (port: {}, max streams: {})",
        config.port,
        config.max_streams
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    tracing::info!(target: "chipcheck::startup", "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

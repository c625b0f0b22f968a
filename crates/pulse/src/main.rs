//! Pulse - Real-time analytics ingestion and aggregation service
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! pulse
//! pulse --config configs/pulse.toml
//!
//! # Explicit subcommand, with a log level override
//! pulse serve --config configs/pulse.toml --log-level debug
//! ```

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pulse_config::LogFormat;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pulse - Real-time analytics ingestion and aggregation service
#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the analytics server (the default when no subcommand is given)
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = cmd::serve::ServeArgs {
        config: cli.config,
        log_level: cli.log_level,
    };

    match cli.command {
        Some(Command::Serve) | None => cmd::serve::run(args).await,
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Console => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }

    Ok(())
}

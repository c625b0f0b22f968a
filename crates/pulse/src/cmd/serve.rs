//! Serve command - run the Pulse server
//!
//! Wires the components together and supervises their lifecycle: the
//! bounded event queue, the worker pool, the aggregator flush loop, and the
//! HTTP server - all stitched to one cancellation token for coordinated
//! shutdown with a bounded drain.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use pulse_aggregate::Aggregator;
use pulse_config::Config;
use pulse_ingest::{HttpServer, HttpServerConfig};
use pulse_pipeline::{bounded, PipelineMetrics, WorkerPool};

/// Serve command arguments
#[derive(Debug, Default)]
pub struct ServeArgs {
    /// Path to configuration file (default paths tried when not specified)
    pub config: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let (config, config_path) = load_config(args.config.as_deref())?;

    let level = args
        .log_level
        .as_deref()
        .unwrap_or_else(|| config.log.level.as_str());
    crate::init_logging(level, config.log.format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        config = %config_path,
        "Pulse starting"
    );

    if let Err(e) = run_server(config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("Pulse shutdown complete");
    Ok(())
}

/// Load configuration from the explicit path, the default paths, or defaults
///
/// Returns the config together with a display string of where it came from.
fn load_config(path: Option<&std::path::Path>) -> Result<(Config, String)> {
    match path {
        Some(path) => {
            // User explicitly provided a config path - it must exist
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            let config = Config::from_file(path).context("failed to load configuration")?;
            Ok((config, path.display().to_string()))
        }
        None => {
            let default_paths = [
                PathBuf::from("configs/pulse.toml"),
                PathBuf::from("pulse.toml"),
            ];

            for path in &default_paths {
                if path.exists() {
                    let config =
                        Config::from_file(path).context("failed to load configuration")?;
                    return Ok((config, path.display().to_string()));
                }
            }

            Ok((Config::default(), "(defaults)".to_string()))
        }
    }
}

/// Main server run loop
async fn run_server(config: Config) -> Result<()> {
    // One token coordinates shutdown across every component
    let cancel = CancellationToken::new();

    // Aggregation engine
    let aggregator = Arc::new(
        Aggregator::new(config.window.size, config.processing.flush_interval)
            .with_retention(config.window.effective_retention()),
    );

    // The seam toward durable storage: closed windows are summarized here.
    aggregator.set_window_closed_callback(|window| {
        let metrics = window.metrics();
        let events = metrics.get("events").map(|m| m.count()).unwrap_or(0);
        let active_users = metrics.get("active_users").map(|m| m.count()).unwrap_or(0);

        info!(
            start = %window.start(),
            end = %window.end(),
            events,
            active_users,
            "window closed"
        );
    });

    // Bounded ingress queue + worker pool
    let (sender, receiver) = bounded(config.processing.buffer_size);
    let pipeline_metrics = Arc::new(PipelineMetrics::new());

    let worker_tasks = WorkerPool::spawn(
        config.processing.worker_count,
        receiver,
        Arc::clone(&aggregator),
        Arc::clone(&pipeline_metrics),
        cancel.clone(),
    );

    info!(
        workers = config.processing.worker_count,
        buffer_size = config.processing.buffer_size,
        "worker pool started"
    );

    // Flush loop (window expiry + callback delivery)
    let flush_task = tokio::spawn(Arc::clone(&aggregator).run(cancel.clone()));

    // HTTP server
    let http_config = HttpServerConfig {
        address: config.server.host.clone(),
        port: config.server.port,
        max_batch_size: config.server.max_batch_size,
    };
    let server = HttpServer::new(
        http_config,
        Arc::clone(&aggregator),
        sender.clone(),
        Arc::clone(&pipeline_metrics),
    );
    let mut http_task = tokio::spawn(server.run(cancel.clone()));

    info!(
        address = %config.server.bind_address(),
        window_secs = config.window.size.as_secs(),
        flush_secs = config.processing.flush_interval.as_secs(),
        "Pulse server running"
    );

    // Run until a shutdown signal arrives or the HTTP server dies
    let mut server_failed = false;
    tokio::select! {
        result = &mut http_task => {
            server_failed = true;
            match result {
                Ok(Ok(())) => warn!("HTTP server exited before shutdown was requested"),
                Ok(Err(e)) => error!(error = %e, "HTTP server error"),
                Err(e) => error!(error = %e, "HTTP server task panicked"),
            }
        }
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, stopping server...");
        }
    }

    // Signal every component, then release our queue handle so the channel
    // disconnects once the HTTP state is gone
    cancel.cancel();
    drop(sender);

    let shutdown_timeout = config.server.shutdown_timeout;

    if !server_failed {
        match timeout(shutdown_timeout, http_task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => warn!(error = %e, "HTTP server error during shutdown"),
            Ok(Err(e)) => warn!(error = %e, "HTTP server task panicked during shutdown"),
            Err(_) => warn!("HTTP server did not stop within timeout"),
        }
    }

    info!("waiting for workers to drain...");
    for task in worker_tasks {
        match timeout(shutdown_timeout, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "worker task panicked during shutdown"),
            Err(_) => warn!("worker did not finish within timeout, continuing shutdown"),
        }
    }

    match timeout(shutdown_timeout, flush_task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "flush task panicked during shutdown"),
        Err(_) => warn!("flush loop did not finish within timeout"),
    }

    let backlog = pipeline_metrics.backlog();
    if backlog > 0 {
        warn!(
            dropped = backlog,
            "events still queued at shutdown deadline were dropped"
        );
    }

    if server_failed {
        anyhow::bail!("HTTP server terminated unexpectedly");
    }
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

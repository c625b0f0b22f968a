//! Pulse HTTP API
//!
//! REST endpoints for event ingestion and metric reads.
//!
//! # Endpoints
//!
//! - `POST /events` - Ingest a single analytics event (JSON)
//! - `POST /events/batch` - Ingest an array of 1..=1000 events
//! - `GET /metrics` - Snapshot of all global metrics
//! - `GET /metrics/{name}` - One global metric by name
//! - `GET /stats` - Aggregator statistics
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//!
//! # Ingestion contract
//!
//! ```text
//! POST /events
//! Content-Type: application/json
//!
//! {"type":"pageview","user_id":"u1","properties":{"page":"/home"}}
//! ```
//!
//! Missing `id` and `timestamp` are filled in server-side. The enqueue is
//! strictly non-blocking: a full queue answers `503` and the caller is
//! expected to retry with backoff. Batch elements are judged one by one;
//! a batch response reports `accepted` and `rejected` counts and partial
//! failure is normal.
//!
//! # Example
//!
//! ```ignore
//! use pulse_ingest::{HttpServer, HttpServerConfig};
//!
//! let server = HttpServer::new(config, aggregator, sender, pipeline_metrics);
//! server.run(cancel_token).await?;
//! ```

mod config;
mod error;
mod handlers;
mod json_types;
mod metrics;


use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use pulse_aggregate::Aggregator;
use pulse_pipeline::{EventSender, PipelineMetrics};

pub use config::HttpServerConfig;
pub use error::ServerError;
pub use handlers::AppState;
pub use metrics::{IngestMetrics, IngestMetricsSnapshot};

use handlers::{
    get_all_metrics, get_metric, get_stats, health_check, ingest_batch, ingest_event, ready_check,
};

/// HTTP server for event ingestion and metric reads
pub struct HttpServer {
    config: HttpServerConfig,
    aggregator: Arc<Aggregator>,
    sender: EventSender,
    pipeline: Arc<PipelineMetrics>,
    metrics: Arc<IngestMetrics>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(
        config: HttpServerConfig,
        aggregator: Arc<Aggregator>,
        sender: EventSender,
        pipeline: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            config,
            aggregator,
            sender,
            pipeline,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Get a shared handle to the ingest metrics
    pub fn metrics(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the HTTP server
    ///
    /// Binds to the configured address and accepts requests until the
    /// cancellation token fires, then shuts down gracefully (in-flight
    /// requests complete, no new connections are accepted).
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        let bind_addr = self.config.bind_address();

        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ServerError::Bind {
                address: bind_addr.clone(),
                source: e,
            })?;

        tracing::info!(address = %bind_addr, "HTTP server listening");

        let state = Arc::new(AppState {
            aggregator: self.aggregator,
            sender: self.sender,
            pipeline: self.pipeline,
            metrics: self.metrics,
            max_batch_size: self.config.max_batch_size,
        });

        let app = build_router(state);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(cancel))
            .await
            .map_err(|e| ServerError::Http(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the axum router
fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/events", post(ingest_event))
        .route("/events/batch", post(ingest_batch))
        .route("/metrics", get(get_all_metrics))
        .route("/metrics/{name}", get(get_metric))
        .route("/stats", get(get_stats))
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .with_state(state)
}

/// Shutdown signal future
async fn shutdown_signal(cancel: CancellationToken) {
    cancel.cancelled().await;
}

//! HTTP route handlers
//!
//! Axum handlers for event ingestion and metric reads. Ingestion parses the
//! raw body itself so malformed payloads get the same error envelope as
//! every other failure.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::{debug, warn};

use pulse_aggregate::{Aggregator, MetricView};
use pulse_pipeline::{EnqueueError, EventSender, PipelineMetrics};

use crate::json_types::{
    ApiResponse, BatchAccepted, ErrorResponse, EventAccepted, EventRequest, HealthResponse,
    ReadyChecks, ReadyResponse,
};
use crate::metrics::IngestMetrics;

/// Shared state for handlers
pub struct AppState {
    /// The aggregation engine (read endpoints)
    pub aggregator: Arc<Aggregator>,

    /// Producer handle for the event queue
    pub sender: EventSender,

    /// Shared pipeline counters (enqueue side)
    pub pipeline: Arc<PipelineMetrics>,

    /// HTTP-level counters
    pub metrics: Arc<IngestMetrics>,

    /// Upper bound on batch ingestion size
    pub max_batch_size: usize,
}

/// POST /events - ingest a single event
pub async fn ingest_event(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    state.metrics.request_received();

    let request: EventRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            state.metrics.request_client_error();
            return error_response(
                StatusCode::BAD_REQUEST,
                "bad_request",
                format!("invalid event data: {}", e),
            );
        }
    };

    let event = match request.into_event(Utc::now()) {
        Some(event) => event,
        None => {
            state.metrics.request_client_error();
            return error_response(
                StatusCode::BAD_REQUEST,
                "bad_request",
                "event type must be a non-empty string",
            );
        }
    };

    let event_id = event.id.clone();
    let event_type = event.event_type.clone();

    match state.sender.try_send(event) {
        Ok(()) => {
            state.pipeline.record_enqueued();
            state.metrics.events_processed(1, 0);
            state.metrics.request_success();

            debug!(event_id = %event_id, event_type = %event_type, "event queued");

            (
                StatusCode::ACCEPTED,
                Json(EventAccepted {
                    status: "accepted",
                    event_id,
                    event_type,
                }),
            )
                .into_response()
        }
        Err(EnqueueError::Full) => {
            state.pipeline.record_rejected();
            state.metrics.events_processed(0, 1);
            state.metrics.backpressure();

            warn!(event_type = %event_type, "event queue full, rejecting event");

            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "queue_full",
                "queue full, try again later",
            )
        }
        Err(EnqueueError::Closed) => {
            state.pipeline.record_rejected();
            state.metrics.events_processed(0, 1);
            state.metrics.request_server_error();

            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "shutting_down",
                "service is shutting down",
            )
        }
    }
}

/// POST /events/batch - ingest an array of 1..=max_batch_size events
///
/// Items are judged one by one: an empty type or a full queue rejects that
/// item and the loop keeps going. The response is `202` with counts as long
/// as the payload itself was valid.
pub async fn ingest_batch(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    state.metrics.request_received();

    let requests: Vec<EventRequest> = match serde_json::from_slice(&body) {
        Ok(requests) => requests,
        Err(e) => {
            state.metrics.request_client_error();
            return error_response(
                StatusCode::BAD_REQUEST,
                "bad_request",
                format!("invalid batch data: {}", e),
            );
        }
    };

    if requests.is_empty() {
        state.metrics.request_client_error();
        return error_response(StatusCode::BAD_REQUEST, "bad_request", "empty batch");
    }
    if requests.len() > state.max_batch_size {
        state.metrics.request_client_error();
        return error_response(
            StatusCode::BAD_REQUEST,
            "bad_request",
            format!(
                "batch size {} exceeds limit of {}",
                requests.len(),
                state.max_batch_size
            ),
        );
    }

    let total = requests.len();
    let now = Utc::now();
    let mut accepted = 0usize;
    let mut rejected = 0usize;

    for request in requests {
        let event = match request.into_event(now) {
            Some(event) => event,
            None => {
                rejected += 1;
                continue;
            }
        };

        match state.sender.try_send(event) {
            Ok(()) => {
                state.pipeline.record_enqueued();
                accepted += 1;
            }
            Err(EnqueueError::Full) | Err(EnqueueError::Closed) => {
                state.pipeline.record_rejected();
                rejected += 1;
            }
        }
    }

    state.metrics.events_processed(accepted, rejected);
    state.metrics.request_success();

    debug!(total, accepted, rejected, "batch processed");

    (
        StatusCode::ACCEPTED,
        Json(BatchAccepted {
            status: "accepted",
            total,
            accepted,
            rejected,
        }),
    )
        .into_response()
}

/// GET /metrics - snapshot of all global metrics
pub async fn get_all_metrics(State(state): State<Arc<AppState>>) -> Response {
    let metrics = state.aggregator.global_metrics();

    let views: HashMap<String, MetricView> = metrics
        .iter()
        .map(|(name, metric)| (name.clone(), metric.view()))
        .collect();

    let message = if views.is_empty() {
        "no metrics yet".to_string()
    } else {
        format!("retrieved {} metrics", views.len())
    };

    (StatusCode::OK, Json(ApiResponse::new(message, views))).into_response()
}

/// GET /metrics/{name} - one global metric
pub async fn get_metric(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    match state.aggregator.global_metric(&name) {
        Some(metric) => (
            StatusCode::OK,
            Json(ApiResponse::new(
                format!("metric '{}' found", name),
                metric.view(),
            )),
        )
            .into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("metric '{}' not found", name),
        ),
    }
}

/// GET /stats - aggregator statistics
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Response {
    let stats = state.aggregator.stats();
    (
        StatusCode::OK,
        Json(ApiResponse::new("aggregator statistics", stats)),
    )
        .into_response()
}

/// GET /health - liveness probe
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            time: Utc::now(),
        }),
    )
}

/// GET /ready - readiness probe
pub async fn ready_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ReadyResponse {
            status: "ready",
            time: Utc::now(),
            checks: ReadyChecks {
                queue: "ok",
                aggregator: "ok",
            },
        }),
    )
}

/// Create an error response
pub fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(error, message))).into_response()
}

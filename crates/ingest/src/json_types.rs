//! JSON request and response types for the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;

use pulse_aggregate::{generate_event_id, Event};

// =============================================================================
// Request Types
// =============================================================================

/// Wire-format event as submitted by producers
///
/// Everything except `type` is optional; missing `id` and `timestamp` are
/// filled in server-side before the event enters the queue.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRequest {
    /// Event type, e.g. "pageview" (required, must be non-empty)
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,

    /// Client-supplied event id
    #[serde(default)]
    pub id: Option<String>,

    /// Event time (RFC3339 UTC); server time when absent
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Originating user
    #[serde(default)]
    pub user_id: Option<String>,

    /// Originating session
    #[serde(default)]
    pub session_id: Option<String>,

    /// Free-form event properties
    #[serde(default)]
    pub properties: Map<String, serde_json::Value>,
}

impl EventRequest {
    /// Validate and default into a domain event
    ///
    /// Returns `None` when the event type is missing or empty - the one
    /// rejection reason the ingest boundary enforces per item.
    pub fn into_event(self, now: DateTime<Utc>) -> Option<Event> {
        let event_type = self.event_type.filter(|t| !t.is_empty())?;

        Some(Event {
            id: self.id.filter(|id| !id.is_empty()).unwrap_or_else(generate_event_id),
            event_type,
            timestamp: self.timestamp.unwrap_or(now),
            user_id: self.user_id,
            session_id: self.session_id,
            properties: self.properties,
        })
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Single event accepted into the queue
#[derive(Debug, Clone, Serialize)]
pub struct EventAccepted {
    /// Always "accepted"
    pub status: &'static str,

    /// Assigned (or client-supplied) event id
    pub event_id: String,

    /// Echo of the event type
    #[serde(rename = "type")]
    pub event_type: String,
}

/// Batch ingestion outcome
///
/// Partial failure is normal: the request is `202` as long as the payload
/// itself was well-formed, with per-item outcomes reflected in the counts.
#[derive(Debug, Clone, Serialize)]
pub struct BatchAccepted {
    /// Always "accepted"
    pub status: &'static str,

    /// Items in the submitted batch
    pub total: usize,

    /// Items queued for processing
    pub accepted: usize,

    /// Items refused (empty type or queue full)
    pub rejected: usize,
}

/// Envelope for read endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always "success"
    pub status: &'static str,

    /// Human-readable summary
    pub message: String,

    /// Payload
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Build a success envelope
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code, e.g. "bad_request", "queue_full"
    pub error: String,

    /// Human-readable message
    pub message: String,
}

impl ErrorResponse {
    /// Create an error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Liveness probe response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "healthy"
    pub status: &'static str,

    /// Server time
    pub time: DateTime<Utc>,
}

/// Readiness probe response
#[derive(Debug, Clone, Serialize)]
pub struct ReadyResponse {
    /// Always "ready"
    pub status: &'static str,

    /// Server time
    pub time: DateTime<Utc>,

    /// Component states
    pub checks: ReadyChecks,
}

/// Per-component readiness states
#[derive(Debug, Clone, Serialize)]
pub struct ReadyChecks {
    /// Ingress queue state
    pub queue: &'static str,

    /// Aggregator state
    pub aggregator: &'static str,
}

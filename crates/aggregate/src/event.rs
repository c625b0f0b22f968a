//! Analytics event
//!
//! The domain representation of a single ingested event. By the time an
//! `Event` reaches the aggregator it is fully formed: the id and timestamp
//! defaults have already been filled in at the ingest boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single analytics event
///
/// Events are immutable once accepted and consumed exactly once by the
/// worker that dequeues them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Opaque event identifier
    pub id: String,

    /// Event type, e.g. "pageview", "click", "purchase" (never empty)
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event time (UTC), used for window bucketing
    pub timestamp: DateTime<Utc>,

    /// Originating user, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Originating session, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Free-form event properties
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl Event {
    /// Create an event of the given type with a generated id and the
    /// current time. Mostly useful in tests and examples.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            id: generate_event_id(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            user_id: None,
            session_id: None,
            properties: Map::new(),
        }
    }

    /// Set the user id (builder style)
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the session id (builder style)
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set a property (builder style)
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set the event timestamp (builder style)
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Look up a string property
    ///
    /// Returns `None` when the key is absent or the value is not a string.
    /// Property types are caller-supplied and untrusted; mismatches are
    /// skipped, never errors.
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Look up a numeric property
    ///
    /// Returns `None` when the key is absent or the value is not a number.
    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    /// Non-empty user id, if any
    pub fn user(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|s| !s.is_empty())
    }

    /// Non-empty session id, if any
    pub fn session(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|s| !s.is_empty())
    }
}

/// Generate an event id from the current wall clock
///
/// Nanosecond-resolution hex, e.g. `evt_17d8a9f3c2b1`. Uniqueness is best
/// effort - ids are opaque tags for correlation, not database keys.
pub fn generate_event_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("evt_{:x}", ts)
}

//! Ingest metrics
//!
//! Atomic counters for the HTTP ingestion surface. Relaxed ordering
//! throughout; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the HTTP ingestion surface
#[derive(Debug, Default)]
pub struct IngestMetrics {
    /// Total HTTP requests received on ingestion endpoints
    requests_total: AtomicU64,

    /// Requests answered 2xx
    requests_success: AtomicU64,

    /// Requests answered 4xx
    requests_client_error: AtomicU64,

    /// Requests answered 5xx
    requests_server_error: AtomicU64,

    /// Events accepted into the queue
    events_accepted: AtomicU64,

    /// Events rejected (validation or backpressure)
    events_rejected: AtomicU64,

    /// Rejections caused specifically by a full queue
    backpressure_rejections: AtomicU64,
}

impl IngestMetrics {
    /// Create a new counter set at zero
    pub const fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_success: AtomicU64::new(0),
            requests_client_error: AtomicU64::new(0),
            requests_server_error: AtomicU64::new(0),
            events_accepted: AtomicU64::new(0),
            events_rejected: AtomicU64::new(0),
            backpressure_rejections: AtomicU64::new(0),
        }
    }

    /// Record a request received
    #[inline]
    pub fn request_received(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful request
    #[inline]
    pub fn request_success(&self) {
        self.requests_success.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a client error (4xx)
    #[inline]
    pub fn request_client_error(&self) {
        self.requests_client_error.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a server error (5xx)
    #[inline]
    pub fn request_server_error(&self) {
        self.requests_server_error.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a backpressure rejection (queue full)
    ///
    /// Counts as a server error: the request was valid, the service
    /// could not take it.
    #[inline]
    pub fn backpressure(&self) {
        self.backpressure_rejections.fetch_add(1, Ordering::Relaxed);
        self.request_server_error();
    }

    /// Record per-item outcomes of an ingestion request
    #[inline]
    pub fn events_processed(&self, accepted: usize, rejected: usize) {
        self.events_accepted
            .fetch_add(accepted as u64, Ordering::Relaxed);
        self.events_rejected
            .fetch_add(rejected as u64, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> IngestMetricsSnapshot {
        IngestMetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_client_error: self.requests_client_error.load(Ordering::Relaxed),
            requests_server_error: self.requests_server_error.load(Ordering::Relaxed),
            events_accepted: self.events_accepted.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            backpressure_rejections: self.backpressure_rejections.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of ingest counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestMetricsSnapshot {
    /// Total HTTP requests received
    pub requests_total: u64,
    /// Requests answered 2xx
    pub requests_success: u64,
    /// Requests answered 4xx
    pub requests_client_error: u64,
    /// Requests answered 5xx
    pub requests_server_error: u64,
    /// Events accepted into the queue
    pub events_accepted: u64,
    /// Events rejected
    pub events_rejected: u64,
    /// Rejections caused by a full queue
    pub backpressure_rejections: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = IngestMetrics::new();

        metrics.request_received();
        metrics.request_success();
        metrics.events_processed(3, 1);

        let snap = metrics.snapshot();
        assert_eq!(snap.requests_total, 1);
        assert_eq!(snap.requests_success, 1);
        assert_eq!(snap.events_accepted, 3);
        assert_eq!(snap.events_rejected, 1);
    }

    #[test]
    fn test_backpressure_counts_as_server_error() {
        let metrics = IngestMetrics::new();
        metrics.backpressure();

        let snap = metrics.snapshot();
        assert_eq!(snap.backpressure_rejections, 1);
        assert_eq!(snap.requests_server_error, 1);
    }
}

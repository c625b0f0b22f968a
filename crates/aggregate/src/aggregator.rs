//! Event aggregator
//!
//! Translates events into metric updates on the cumulative global set and
//! on the tumbling window matching each event's timestamp, and drives the
//! periodic flush that closes expired windows, delivers them to the
//! registered callback, and prunes the retained backlog.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::event::Event;
use crate::metric::{Metric, MetricKind};
use crate::store::MetricSet;
use crate::window::{TimeWindow, WindowManager};
use crate::RETENTION_MULTIPLIER;

/// Callback invoked for every closed window, serially, from the flush task
///
/// The callee must not mutate the window's metrics; reads are fine.
pub type WindowClosedCallback = Box<dyn Fn(&TimeWindow) + Send + Sync>;

/// Aggregator statistics, as exposed by the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AggregatorStats {
    /// Events processed since start (or last reset)
    pub total_events: i64,
    /// Distinct users seen
    pub unique_users: i64,
    /// Distinct sessions seen
    pub unique_sessions: i64,
    /// Currently open windows
    pub active_windows: usize,
    /// Number of global metrics
    pub metrics_count: usize,
    /// Seconds since start (or last reset)
    pub uptime_secs: f64,
}

/// The aggregation engine
///
/// Owns the global metric set and the window manager exclusively. Safe for
/// concurrent `process_event` calls from many workers; the flush loop runs
/// as a single dedicated task.
pub struct Aggregator {
    global: MetricSet,
    windows: WindowManager,
    flush_interval: Duration,
    retention: Duration,
    on_window_closed: RwLock<Option<WindowClosedCallback>>,
}

impl Aggregator {
    /// Create an aggregator with the given window width and flush cadence
    ///
    /// Closed windows are retained for 5x the window duration by default;
    /// override with [`with_retention`](Self::with_retention).
    pub fn new(window_duration: Duration, flush_interval: Duration) -> Self {
        Self {
            global: MetricSet::new(),
            windows: WindowManager::new(window_duration),
            flush_interval,
            retention: window_duration * RETENTION_MULTIPLIER,
            on_window_closed: RwLock::new(None),
        }
    }

    /// Override how long closed windows are retained before cleanup
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Register the window-closed callback
    ///
    /// A single callback slot; registering again replaces the previous one.
    pub fn set_window_closed_callback<F>(&self, callback: F)
    where
        F: Fn(&TimeWindow) + Send + Sync + 'static,
    {
        *self.on_window_closed.write() = Some(Box::new(callback));
    }

    /// Process one event: update global metrics, then the event's window
    ///
    /// Atomic at the event level; concurrent calls are safe. Events older
    /// than the retention horizon update global metrics only - their window
    /// would be closed and pruned before anyone could observe it.
    pub fn process_event(&self, event: &Event) {
        self.update_global_metrics(event);

        let cutoff = Utc::now() - chrono::Duration::milliseconds(self.retention.as_millis() as i64);
        if event.timestamp < cutoff {
            trace!(
                event_id = %event.id,
                timestamp = %event.timestamp,
                "event older than retention horizon, skipping window update"
            );
            return;
        }

        let window = self.windows.get_or_create_window(event.timestamp);
        self.update_window_metrics(&window, event);

        trace!(
            event_id = %event.id,
            event_type = %event.event_type,
            window_start = %window.start(),
            "event processed"
        );
    }

    /// Global metric updates for one event
    fn update_global_metrics(&self, event: &Event) {
        self.counter("total_events").increment();
        self.counter(&format!("events_by_type:{}", event.event_type))
            .increment();

        if let Some(user) = event.user() {
            self.global
                .get_or_create("unique_users", MetricKind::UniqueSet)
                .add_unique(user);
        }
        if let Some(session) = event.session() {
            self.global
                .get_or_create("unique_sessions", MetricKind::UniqueSet)
                .add_unique(session);
        }

        match event.event_type.as_str() {
            "pageview" => self.process_pageview(event),
            "click" => self.process_click(event),
            "purchase" => self.process_purchase(event),
            _ => {}
        }
    }

    fn process_pageview(&self, event: &Event) {
        self.counter("pageviews").increment();

        if let Some(page) = event.prop_str("page") {
            self.global
                .get_or_create("unique_pages", MetricKind::UniqueSet)
                .add_unique(page);
            self.counter(&format!("page_views:{}", page)).increment();
        }
    }

    fn process_click(&self, event: &Event) {
        self.counter("clicks").increment();

        if let Some(element) = event.prop_str("element") {
            self.counter(&format!("clicks:{}", element)).increment();
        }
    }

    fn process_purchase(&self, event: &Event) {
        self.counter("purchases").increment();

        if let Some(amount) = event.prop_f64("amount") {
            self.counter("revenue").increment_by(amount);
            self.global
                .get_or_create("revenue_histogram", MetricKind::Histogram)
                .observe(amount);
        }
    }

    /// Per-window metric updates for one event
    fn update_window_metrics(&self, window: &TimeWindow, event: &Event) {
        let metrics = window.metrics();
        metrics.get_or_create("events", MetricKind::Counter).increment();
        metrics
            .get_or_create(&format!("events:{}", event.event_type), MetricKind::Counter)
            .increment();

        if let Some(user) = event.user() {
            metrics
                .get_or_create("active_users", MetricKind::UniqueSet)
                .add_unique(user);
        }
    }

    fn counter(&self, name: &str) -> Arc<Metric> {
        self.global.get_or_create(name, MetricKind::Counter)
    }

    /// Run the flush loop until cancellation
    ///
    /// Spawn this as a tokio task. Each tick closes expired windows,
    /// delivers them to the callback, and prunes closed windows past the
    /// retention horizon. On cancellation one final close-and-deliver sweep
    /// runs so in-flight windows are not silently lost.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            window_secs = self.windows.duration().as_secs(),
            flush_secs = self.flush_interval.as_secs(),
            retention_secs = self.retention.as_secs(),
            "aggregator started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.flush_expired(Utc::now());
                    info!("aggregator stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.flush_expired(Utc::now());
                    self.windows.cleanup(self.retention, Utc::now());
                }
            }
        }
    }

    /// Close expired windows and deliver them to the callback
    ///
    /// Callbacks run serially; a panicking callback is caught and logged so
    /// the flush loop survives it.
    pub(crate) fn flush_expired(&self, now: DateTime<Utc>) {
        let closed = self.windows.close_expired_windows(now);
        if closed.is_empty() {
            return;
        }

        info!(count = closed.len(), "flushing expired windows");

        let callback = self.on_window_closed.read();
        for window in &closed {
            debug!(
                start = %window.start(),
                end = %window.end(),
                metrics_count = window.metrics().len(),
                "window closed"
            );

            if let Some(cb) = callback.as_ref() {
                let result = catch_unwind(AssertUnwindSafe(|| cb(window)));
                if result.is_err() {
                    error!(
                        window_start = %window.start(),
                        "window-closed callback panicked; continuing"
                    );
                }
            }
        }
    }

    /// Shallow copy of the global name -> metric mapping
    pub fn global_metrics(&self) -> HashMap<String, Arc<Metric>> {
        self.global.snapshot()
    }

    /// Current value of a global metric, if present
    pub fn global_metric_value(&self, name: &str) -> Option<f64> {
        self.global.metric_value(name)
    }

    /// Look up a single global metric by name
    pub fn global_metric(&self, name: &str) -> Option<Arc<Metric>> {
        self.global.get(name)
    }

    /// Currently open windows, in creation order
    pub fn active_windows(&self) -> Vec<Arc<TimeWindow>> {
        self.windows.active_windows()
    }

    /// Aggregator statistics
    pub fn stats(&self) -> AggregatorStats {
        let count_of = |name: &str| self.global.get(name).map(|m| m.count()).unwrap_or(0);

        AggregatorStats {
            total_events: count_of("total_events"),
            unique_users: count_of("unique_users"),
            unique_sessions: count_of("unique_sessions"),
            active_windows: self.windows.active_windows().len(),
            metrics_count: self.global.len(),
            uptime_secs: (Utc::now() - self.global.created_at())
                .num_milliseconds()
                .max(0) as f64
                / 1000.0,
        }
    }

    /// Clear global metrics and drop every window
    ///
    /// Intended for tests and operational resets; global metrics are never
    /// reset in normal operation.
    pub fn reset(&self) {
        self.global.reset();
        self.windows.reset();
        info!("aggregator reset");
    }

    #[cfg(test)]
    pub(crate) fn window_manager(&self) -> &WindowManager {
        &self.windows
    }
}

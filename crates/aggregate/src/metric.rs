//! Metric primitives
//!
//! A `Metric` is a named aggregation of one kind: counter, gauge, histogram
//! or unique-set. Name and kind are fixed at creation; all mutable state
//! lives behind a per-metric lock so that concurrent updates to the same
//! metric serialize without contending with updates to any other metric.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// The kind of aggregation a metric performs
///
/// Assigned at first use and immutable afterwards: a later get-or-create
/// with a different kind returns the existing metric unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Monotonically accumulating sum (value += v, count += 1)
    Counter,
    /// Last-write-wins instantaneous value
    Gauge,
    /// Ordered sequence of observations plus running sum
    Histogram,
    /// Deduplicated set of strings; count tracks cardinality
    UniqueSet,
}

/// Mutable metric state, guarded by the metric's lock
#[derive(Debug)]
struct MetricState {
    value: f64,
    count: i64,
    last_update: DateTime<Utc>,
    observations: Vec<f64>,
    unique: HashSet<String>,
}

/// A single named metric
///
/// Shared across threads as `Arc<Metric>`. All mutators are atomic with
/// respect to each other and to reads: no update is lost and no torn state
/// is observable.
#[derive(Debug)]
pub struct Metric {
    name: String,
    kind: MetricKind,
    state: Mutex<MetricState>,
}

impl Metric {
    /// Create a new metric of the given kind
    pub fn new(name: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            kind,
            state: Mutex::new(MetricState {
                value: 0.0,
                count: 0,
                last_update: Utc::now(),
                observations: Vec::new(),
                unique: HashSet::new(),
            }),
        }
    }

    /// Metric name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Metric kind
    #[inline]
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Increment by one (counter semantics)
    pub fn increment(&self) {
        self.increment_by(1.0);
    }

    /// Increment by an arbitrary amount
    pub fn increment_by(&self, amount: f64) {
        let mut state = self.state.lock();
        state.value += amount;
        state.count += 1;
        state.last_update = Utc::now();
    }

    /// Set the current value (gauge semantics); count is left unchanged
    pub fn set(&self, value: f64) {
        let mut state = self.state.lock();
        state.value = value;
        state.last_update = Utc::now();
    }

    /// Record an observation (histogram semantics)
    ///
    /// Appends to the observation sequence regardless of kind so a
    /// distribution can be derived later from any metric.
    pub fn observe(&self, value: f64) {
        let mut state = self.state.lock();
        state.observations.push(value);
        state.value += value;
        state.count += 1;
        state.last_update = Utc::now();
    }

    /// Insert a value into the unique set; count tracks the set size
    pub fn add_unique(&self, value: impl Into<String>) {
        let mut state = self.state.lock();
        state.unique.insert(value.into());
        state.count = state.unique.len() as i64;
        state.last_update = Utc::now();
    }

    /// Current value
    pub fn value(&self) -> f64 {
        self.state.lock().value
    }

    /// Current count
    pub fn count(&self) -> i64 {
        self.state.lock().count
    }

    /// Time of the most recent mutation
    pub fn last_update(&self) -> DateTime<Utc> {
        self.state.lock().last_update
    }

    /// Mean of accumulated values: value / count, or 0 when count is 0
    ///
    /// Defined on every kind, not just histograms.
    pub fn average(&self) -> f64 {
        let state = self.state.lock();
        if state.count == 0 {
            0.0
        } else {
            state.value / state.count as f64
        }
    }

    /// Number of recorded observations
    pub fn observation_count(&self) -> usize {
        self.state.lock().observations.len()
    }

    /// Point-in-time serializable view of this metric
    pub fn view(&self) -> MetricView {
        let state = self.state.lock();
        let average = if state.count == 0 {
            0.0
        } else {
            state.value / state.count as f64
        };

        MetricView {
            name: self.name.clone(),
            kind: self.kind,
            value: state.value,
            count: state.count,
            average,
            last_update: state.last_update,
            observations: state.observations.clone(),
        }
    }
}

/// Serializable snapshot of a single metric
///
/// The raw unique set is intentionally not exposed; its cardinality is
/// carried by `count`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricView {
    /// Metric name
    pub name: String,
    /// Metric kind
    pub kind: MetricKind,
    /// Accumulated value (semantics depend on kind)
    pub value: f64,
    /// Update count, or set cardinality for unique-sets
    pub count: i64,
    /// value / count (0 when count is 0)
    pub average: f64,
    /// Time of the most recent mutation
    pub last_update: DateTime<Utc>,
    /// Recorded observations (histograms)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub observations: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counter_increment() {
        let metric = Metric::new("requests", MetricKind::Counter);

        for _ in 0..10 {
            metric.increment();
        }

        assert_eq!(metric.count(), 10);
        assert_eq!(metric.value(), 10.0);
    }

    #[test]
    fn test_counter_increment_by() {
        let metric = Metric::new("revenue", MetricKind::Counter);

        metric.increment_by(99.99);
        metric.increment_by(149.99);
        metric.increment_by(49.99);

        assert!((metric.value() - 299.97).abs() < 1e-6);
        assert_eq!(metric.count(), 3);
    }

    #[test]
    fn test_gauge_set_leaves_count() {
        let metric = Metric::new("queue_depth", MetricKind::Gauge);

        metric.set(42.0);
        metric.set(7.0);

        assert_eq!(metric.value(), 7.0);
        assert_eq!(metric.count(), 0);
    }

    #[test]
    fn test_histogram_observe() {
        let metric = Metric::new("latency", MetricKind::Histogram);

        for v in [10.0, 20.0, 30.0, 40.0, 50.0] {
            metric.observe(v);
        }

        assert_eq!(metric.count(), 5);
        assert_eq!(metric.observation_count(), 5);
        assert_eq!(metric.value(), 150.0);
        assert_eq!(metric.average(), 30.0);
    }

    #[test]
    fn test_unique_set_dedup() {
        let metric = Metric::new("unique_users", MetricKind::UniqueSet);

        metric.add_unique("user_1");
        metric.add_unique("user_2");
        metric.add_unique("user_1");
        metric.add_unique("user_3");
        metric.add_unique("user_2");

        assert_eq!(metric.count(), 3);
    }

    #[test]
    fn test_average_empty_is_zero() {
        let metric = Metric::new("empty", MetricKind::Counter);
        assert_eq!(metric.average(), 0.0);
    }

    #[test]
    fn test_average_on_counter() {
        let metric = Metric::new("avg", MetricKind::Counter);
        metric.increment_by(10.0);
        metric.increment_by(20.0);
        metric.increment_by(30.0);

        assert_eq!(metric.average(), 20.0);
    }

    #[test]
    fn test_view_skips_empty_observations() {
        let metric = Metric::new("c", MetricKind::Counter);
        metric.increment();

        let json = serde_json::to_value(metric.view()).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["kind"], "counter");
        assert!(json.get("observations").is_none());
    }

    #[test]
    fn test_concurrent_increments_lose_nothing() {
        let metric = Arc::new(Metric::new("contended", MetricKind::Counter));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let m = Arc::clone(&metric);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    m.increment();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metric.count(), 8000);
        assert_eq!(metric.value(), 8000.0);
    }
}

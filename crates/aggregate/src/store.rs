//! Name-keyed metric set
//!
//! `MetricSet` maps metric names to shared `Metric` handles with
//! linearizable get-or-create. The map-wide lock is only held for lookups
//! and insertions; once a caller holds an `Arc<Metric>` it updates the
//! metric through its own lock without touching the set again.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::metric::{Metric, MetricKind};

#[derive(Debug)]
struct Inner {
    metrics: HashMap<String, Arc<Metric>>,
    created_at: DateTime<Utc>,
}

/// A set of named metrics with get-or-create semantics
#[derive(Debug)]
pub struct MetricSet {
    inner: RwLock<Inner>,
}

impl MetricSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                metrics: HashMap::new(),
                created_at: Utc::now(),
            }),
        }
    }

    /// Return the metric with this name, creating it with the given kind
    /// when absent
    ///
    /// When the name already exists the stored metric is returned as-is and
    /// the requested kind is ignored - kind is assigned at first use and
    /// never changes. Two concurrent calls with the same name return the
    /// same `Arc`.
    pub fn get_or_create(&self, name: &str, kind: MetricKind) -> Arc<Metric> {
        // Fast path: metric already exists
        {
            let inner = self.inner.read();
            if let Some(metric) = inner.metrics.get(name) {
                return Arc::clone(metric);
            }
        }

        // Slow path: take the write lock and re-check, another caller may
        // have inserted between the read and write sections
        let mut inner = self.inner.write();
        Arc::clone(
            inner
                .metrics
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Metric::new(name, kind))),
        )
    }

    /// Look up a metric by name
    pub fn get(&self, name: &str) -> Option<Arc<Metric>> {
        self.inner.read().metrics.get(name).map(Arc::clone)
    }

    /// Current value of the named metric, if present
    pub fn metric_value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|m| m.value())
    }

    /// Shallow copy of the full name -> metric mapping
    ///
    /// The returned map shares `Metric` handles with the set; values read
    /// through them are live.
    pub fn snapshot(&self) -> HashMap<String, Arc<Metric>> {
        self.inner.read().metrics.clone()
    }

    /// Drop all metrics and restart the creation clock
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.metrics = HashMap::new();
        inner.created_at = Utc::now();
    }

    /// Number of metrics in the set
    pub fn len(&self) -> usize {
        self.inner.read().metrics.len()
    }

    /// Whether the set holds no metrics
    pub fn is_empty(&self) -> bool {
        self.inner.read().metrics.is_empty()
    }

    /// When this set was created (or last reset)
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.read().created_at
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        Self::new()
    }
}

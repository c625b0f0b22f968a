//! Pulse Aggregation Engine
//!
//! The in-memory core of the analytics service: typed metric primitives,
//! a name-keyed metric set, tumbling time windows, and the aggregator that
//! maps incoming events onto both.
//!
//! # Architecture
//!
//! ```text
//! [Workers] ──→ Aggregator::process_event
//!                  ├──→ global MetricSet      (cumulative since start)
//!                  └──→ WindowManager         (per-minute tumbling windows)
//!                          └──→ TimeWindow ──→ MetricSet
//!
//! [Flush task] ──→ Aggregator::run            (close expired, callback, prune)
//! ```
//!
//! # Key Design
//!
//! - **Fine-grained locking**: every `Metric` carries its own lock, so
//!   unrelated counters never contend. The metric set only locks map-wide
//!   for insertions.
//! - **Shared references**: snapshots hand out `Arc<Metric>` clones, not
//!   copies - readers see live values without re-entering the map.
//! - **Timestamp bucketing**: windows are keyed by event time, not arrival
//!   order, so out-of-order events land in the window they belong to.
//! - **Isolated callbacks**: the window-closed callback runs serially on the
//!   flush task, with panics caught so they cannot kill the loop.

mod aggregator;
mod event;
mod metric;
mod store;
mod window;


pub use aggregator::{Aggregator, AggregatorStats, WindowClosedCallback};
pub use event::{generate_event_id, Event};
pub use metric::{Metric, MetricKind, MetricView};
pub use store::MetricSet;
pub use window::{TimeWindow, WindowManager};

/// Default tumbling window width
pub const DEFAULT_WINDOW_DURATION: std::time::Duration = std::time::Duration::from_secs(60);

/// Default interval between expiry sweeps
pub const DEFAULT_FLUSH_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

/// Closed windows are retained for this multiple of the window duration
/// before cleanup drops them.
pub const RETENTION_MULTIPLIER: u32 = 5;

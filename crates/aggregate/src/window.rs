//! Tumbling time windows
//!
//! Events are bucketed into fixed-width, non-overlapping windows by their
//! event timestamp. The `WindowManager` owns the window collection: aligned
//! get-or-create, expiry, and retention-based cleanup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::store::MetricSet;

/// A single tumbling window over `[start, end)`
///
/// Shared as `Arc<TimeWindow>` between the manager, the flush task and the
/// window-closed callback. The closed flag is monotonic: once set it never
/// clears.
#[derive(Debug)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    duration: Duration,
    metrics: MetricSet,
    closed: AtomicBool,
}

impl TimeWindow {
    /// Create a window starting at an aligned instant
    pub fn new(start: DateTime<Utc>, duration: Duration) -> Self {
        let end = start + chrono::Duration::milliseconds(duration.as_millis() as i64);
        Self {
            start,
            end,
            duration,
            metrics: MetricSet::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Window start (inclusive)
    #[inline]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Window end (exclusive)
    #[inline]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Window width
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Per-window metrics
    #[inline]
    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    /// Whether the window has been closed
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Whether `t` falls inside an open window: `!closed && t < end`
    ///
    /// An instant at exactly `end` belongs to the next window.
    pub fn is_active(&self, t: DateTime<Utc>) -> bool {
        !self.is_closed() && t < self.end
    }

    /// Whether the window is overdue for closing: `!closed && t > end`
    pub fn should_close(&self, t: DateTime<Utc>) -> bool {
        !self.is_closed() && t > self.end
    }

    /// Close the window
    ///
    /// Idempotent. Returns true only for the call that actually performed
    /// the transition, so callers can act exactly once per window.
    pub fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }
}

/// Owner of the window collection for one tumbling duration
///
/// Invariant: at most one *open* window exists per aligned start instant.
/// Closed windows linger until the cleanup horizon passes their end.
#[derive(Debug)]
pub struct WindowManager {
    duration: Duration,
    windows: Mutex<Vec<Arc<TimeWindow>>>,
}

impl WindowManager {
    /// Create a manager for windows of the given fixed width
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            windows: Mutex::new(Vec::new()),
        }
    }

    /// The fixed window width
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Floor `t` to the window boundary containing it
    ///
    /// Works on epoch milliseconds with euclidean division so pre-epoch
    /// timestamps still floor toward negative infinity.
    pub fn align_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let dur_ms = self.duration.as_millis() as i64;
        let start_ms = t.timestamp_millis().div_euclid(dur_ms) * dur_ms;
        DateTime::from_timestamp_millis(start_ms).unwrap_or(t)
    }

    /// Return the open window for `t`'s bucket, creating it when absent
    ///
    /// Linearizable: the collection lock is held across the scan and the
    /// insert, so two concurrent calls for the same bucket return the same
    /// window. Closed windows are skipped.
    pub fn get_or_create_window(&self, t: DateTime<Utc>) -> Arc<TimeWindow> {
        let start = self.align_start(t);
        let mut windows = self.windows.lock();

        for window in windows.iter() {
            if window.start() == start && !window.is_closed() {
                return Arc::clone(window);
            }
        }

        let window = Arc::new(TimeWindow::new(start, self.duration));
        windows.push(Arc::clone(&window));
        window
    }

    /// Close every window whose end has passed `now`
    ///
    /// Returns the windows closed by this call, in encounter order. Closure
    /// is idempotent; a window never appears in two sweeps.
    pub fn close_expired_windows(&self, now: DateTime<Utc>) -> Vec<Arc<TimeWindow>> {
        let windows = self.windows.lock();
        let mut closed = Vec::new();

        for window in windows.iter() {
            if window.should_close(now) && window.close() {
                closed.push(Arc::clone(window));
            }
        }

        closed
    }

    /// Drop closed windows whose end is older than `now - keep`
    ///
    /// Open windows are always retained.
    pub fn cleanup(&self, keep: Duration, now: DateTime<Utc>) {
        let keep_ms = keep.as_millis() as i64;
        let mut windows = self.windows.lock();
        windows.retain(|w| !w.is_closed() || (now - w.end()).num_milliseconds() < keep_ms);
    }

    /// Open windows in insertion order
    pub fn active_windows(&self) -> Vec<Arc<TimeWindow>> {
        self.windows
            .lock()
            .iter()
            .filter(|w| !w.is_closed())
            .map(Arc::clone)
            .collect()
    }

    /// Total retained windows, open and closed
    pub fn window_count(&self) -> usize {
        self.windows.lock().len()
    }

    /// Drop every window
    pub fn reset(&self) {
        self.windows.lock().clear();
    }
}

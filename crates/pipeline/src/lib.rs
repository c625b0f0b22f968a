//! Pulse Pipeline
//!
//! The ingress queue and worker pool sitting between the HTTP boundary and
//! the aggregation engine.
//!
//! # Architecture
//!
//! ```text
//! [HTTP handlers] ──try_send──→ bounded MPMC queue ──recv──→ [Worker 0..N]
//!                     │                                          │
//!                 full? 503                            Aggregator::process_event
//! ```
//!
//! # Key Design
//!
//! - **Non-blocking enqueue**: producers use `try_send` only. A full queue
//!   is surfaced as backpressure to the caller, never as a stalled request.
//! - **Multi-consumer drain**: the queue is MPMC; every worker holds its own
//!   receiver clone and the channel hands each event to exactly one worker.
//! - **Bounded shutdown**: on cancellation workers switch to draining the
//!   queue until it is empty, so accepted events are not dropped unless the
//!   shutdown deadline expires first.

mod metrics;
mod queue;
mod worker;

pub use metrics::{PipelineMetrics, PipelineSnapshot};
pub use queue::{bounded, EnqueueError, EventReceiver, EventSender};
pub use worker::WorkerPool;

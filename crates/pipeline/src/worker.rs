//! Worker pool
//!
//! A fixed pool of consumers draining the event queue into the aggregator.
//! Workers have no per-event blocking I/O; the only suspension point is the
//! queue itself.

use std::sync::Arc;

use pulse_aggregate::Aggregator;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::metrics::PipelineMetrics;
use crate::queue::EventReceiver;

/// Spawner for the worker pool
pub struct WorkerPool;

impl WorkerPool {
    /// Spawn `count` workers consuming from the queue
    ///
    /// Each worker runs until cancellation (after which it drains whatever
    /// is still queued) or until the channel disconnects. Returns the task
    /// handles so the supervisor can join them with a deadline.
    pub fn spawn(
        count: usize,
        receiver: EventReceiver,
        aggregator: Arc<Aggregator>,
        metrics: Arc<PipelineMetrics>,
        cancel: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(count);

        for worker_id in 0..count {
            let receiver = receiver.clone();
            let aggregator = Arc::clone(&aggregator);
            let metrics = Arc::clone(&metrics);
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                worker_loop(worker_id, receiver, aggregator, metrics, cancel).await;
            }));
        }

        handles
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: EventReceiver,
    aggregator: Arc<Aggregator>,
    metrics: Arc<PipelineMetrics>,
    cancel: CancellationToken,
) {
    debug!(worker_id, "worker started");

    let mut processed: u64 = 0;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                // Drain whatever is already queued, then stop. The
                // supervisor bounds this with the shutdown deadline.
                while let Some(event) = receiver.try_recv() {
                    aggregator.process_event(&event);
                    metrics.record_processed();
                    processed += 1;
                }
                break;
            }

            event = receiver.recv() => match event {
                Some(event) => {
                    aggregator.process_event(&event);
                    metrics.record_processed();
                    processed += 1;
                }
                // Every sender dropped: nothing more will arrive
                None => break,
            }
        }
    }

    debug!(worker_id, processed, "worker stopping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::bounded;
    use pulse_aggregate::Event;
    use std::time::Duration;

    fn test_aggregator() -> Arc<Aggregator> {
        Arc::new(Aggregator::new(
            Duration::from_secs(60),
            Duration::from_secs(5),
        ))
    }

    async fn wait_for_processed(metrics: &PipelineMetrics, expected: u64) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while metrics.snapshot().events_processed < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("workers did not catch up in time");
    }

    #[tokio::test]
    async fn test_workers_drain_queue_into_aggregator() {
        let (tx, rx) = bounded(128);
        let aggregator = test_aggregator();
        let metrics = Arc::new(PipelineMetrics::new());
        let cancel = CancellationToken::new();

        let handles = WorkerPool::spawn(
            4,
            rx,
            Arc::clone(&aggregator),
            Arc::clone(&metrics),
            cancel.clone(),
        );

        for i in 0..50 {
            let event = Event::new("pageview").with_user(format!("user_{}", i % 5));
            tx.try_send(event).unwrap();
            metrics.record_enqueued();
        }

        wait_for_processed(&metrics, 50).await;

        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(aggregator.global_metric("total_events").unwrap().count(), 50);
        assert_eq!(aggregator.global_metric("unique_users").unwrap().count(), 5);
        assert_eq!(metrics.backlog(), 0);
    }

    #[tokio::test]
    async fn test_workers_drain_backlog_on_cancellation() {
        let (tx, rx) = bounded(128);
        let aggregator = test_aggregator();
        let metrics = Arc::new(PipelineMetrics::new());
        let cancel = CancellationToken::new();

        // Fill the queue before any worker exists, then cancel immediately:
        // the drain path has to pick everything up.
        for _ in 0..30 {
            tx.try_send(Event::new("click")).unwrap();
            metrics.record_enqueued();
        }

        let handles = WorkerPool::spawn(
            2,
            rx,
            Arc::clone(&aggregator),
            Arc::clone(&metrics),
            cancel.clone(),
        );
        cancel.cancel();

        for handle in handles {
            tokio::time::timeout(Duration::from_secs(2), handle)
                .await
                .expect("worker should stop promptly")
                .unwrap();
        }

        assert_eq!(aggregator.global_metric("total_events").unwrap().count(), 30);
        assert_eq!(metrics.backlog(), 0);
    }

    #[tokio::test]
    async fn test_workers_exit_on_disconnect() {
        let (tx, rx) = bounded(8);
        let aggregator = test_aggregator();
        let metrics = Arc::new(PipelineMetrics::new());
        let cancel = CancellationToken::new();

        let handles = WorkerPool::spawn(2, rx, aggregator, metrics, cancel);
        drop(tx);

        for handle in handles {
            tokio::time::timeout(Duration::from_secs(2), handle)
                .await
                .expect("worker should exit once senders are gone")
                .unwrap();
        }
    }
}

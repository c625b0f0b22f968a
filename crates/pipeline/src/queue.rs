//! Bounded event queue
//!
//! A thin wrapper around a crossfire bounded MPMC channel carrying `Event`.
//! Producers (HTTP handlers) enqueue with a non-blocking `try_send`;
//! consumers (workers) block on `recv` until an event arrives or every
//! sender is gone.

use crossfire::{MAsyncRx, MAsyncTx, TrySendError};
use pulse_aggregate::Event;
use thiserror::Error;

/// Why an enqueue was refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    /// The queue is at capacity - backpressure, caller should retry later
    #[error("event queue is full")]
    Full,

    /// Every receiver is gone - the pipeline is shutting down
    #[error("event queue is closed")]
    Closed,
}

/// Producer handle for the event queue
///
/// Cheap to clone; one lives in the HTTP handler state.
#[derive(Clone)]
pub struct EventSender {
    tx: MAsyncTx<Event>,
    capacity: usize,
}

impl EventSender {
    /// Enqueue an event without blocking
    ///
    /// Succeeds immediately or reports why it cannot; it never waits for
    /// queue space.
    pub fn try_send(&self, event: Event) -> Result<(), EnqueueError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(EnqueueError::Full),
            Err(TrySendError::Disconnected(_)) => Err(EnqueueError::Closed),
        }
    }

    /// The fixed queue capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender")
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Consumer handle for the event queue
///
/// Cloned once per worker; the channel delivers each event to exactly one
/// of them.
#[derive(Clone)]
pub struct EventReceiver {
    rx: MAsyncRx<Event>,
}

impl EventReceiver {
    /// Wait for the next event
    ///
    /// Returns `None` once the queue is empty and every sender has been
    /// dropped.
    pub async fn recv(&self) -> Option<Event> {
        self.rx.recv().await.ok()
    }

    /// Take an event if one is immediately available
    pub fn try_recv(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

/// Create a bounded event queue with the given capacity
pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = crossfire::mpmc::bounded_async(capacity);
    (EventSender { tx, capacity }, EventReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_send_full() {
        let (tx, _rx) = bounded(2);

        assert!(tx.try_send(Event::new("a")).is_ok());
        assert!(tx.try_send(Event::new("b")).is_ok());
        assert_eq!(tx.try_send(Event::new("c")), Err(EnqueueError::Full));
    }

    #[test]
    fn test_try_send_closed() {
        let (tx, rx) = bounded(2);
        drop(rx);

        assert_eq!(tx.try_send(Event::new("a")), Err(EnqueueError::Closed));
    }

    #[tokio::test]
    async fn test_recv_in_order() {
        let (tx, rx) = bounded(8);

        tx.try_send(Event::new("first")).unwrap();
        tx.try_send(Event::new("second")).unwrap();

        assert_eq!(rx.recv().await.unwrap().event_type, "first");
        assert_eq!(rx.recv().await.unwrap().event_type, "second");
    }

    #[tokio::test]
    async fn test_recv_none_after_senders_dropped() {
        let (tx, rx) = bounded(2);
        tx.try_send(Event::new("last")).unwrap();
        drop(tx);

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_try_recv_empty() {
        let (_tx, rx) = bounded(2);
        assert!(rx.try_recv().is_none());
    }
}

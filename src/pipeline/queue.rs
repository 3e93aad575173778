//! Bounded closeable queue: the only hand-off between pipeline stages.
//!
//! Built on a crossbeam bounded channel. The queue keeps the single long-lived [`Sender`];
//! [`BoundedQueue::close`] drops it. A receiver blocked in `recv()` is woken by the
//! disconnect (crossbeam wakes every waiter), still drains buffered items, and only then
//! sees the closed state. A `put` already in progress when `close` runs holds its own
//! sender clone until it completes, so nothing buffered is lost.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue is closed")]
    Closed,
}

struct Shared<T> {
    tx: Mutex<Option<Sender<T>>>,
    rx: Receiver<T>,
}

/// Finite-capacity FIFO with an explicit, irreversible close. Clones share one queue.
pub struct BoundedQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> BoundedQueue<T> {
    /// `capacity` is clamped to at least 1 (a zero-capacity channel would be a rendezvous).
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                tx: Mutex::new(Some(tx)),
                rx,
            }),
        }
    }

    fn sender_slot(&self) -> MutexGuard<'_, Option<Sender<T>>> {
        // Poisoning only means another thread panicked mid put/close; the slot is still valid.
        self.shared
            .tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enqueue `item`, blocking while the queue is at capacity.
    pub fn put(&self, item: T) -> Result<(), QueueError> {
        let tx = self.sender_slot().clone().ok_or(QueueError::Closed)?;
        tx.send(item).map_err(|_| QueueError::Closed)
    }

    /// Oldest buffered item. Blocks while empty and open; `Closed` once empty and closed.
    pub fn get(&self) -> Result<T, QueueError> {
        self.shared.rx.recv().map_err(|_| QueueError::Closed)
    }

    /// Mark closed and wake every waiter. Idempotent.
    pub fn close(&self) {
        self.sender_slot().take();
    }

    pub fn is_closed(&self) -> bool {
        self.sender_slot().is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.rx.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shared.rx.len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.rx.capacity().unwrap_or(1)
    }
}

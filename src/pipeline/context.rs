//! What travels between stages, and the queues it travels on.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::batch::Batch;
use super::queue::BoundedQueue;
use crate::utils::StageLog;

/// One queue entry per submitted batch: the batch itself, or the id of a batch that failed
/// upstream (so downstream counts stay one-per-batch).
#[derive(Debug)]
pub enum Handoff {
    Ready(Batch),
    Skipped(usize),
}

impl Handoff {
    pub fn batch_id(&self) -> usize {
        match self {
            Handoff::Ready(batch) => batch.id(),
            Handoff::Skipped(id) => *id,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Handoff::Ready(_))
    }
}

pub type StageQueue = BoundedQueue<Handoff>;

/// The three inter-stage queues: feeder → fetch → transform → publish.
pub struct PipelineQueues {
    pub fetch: StageQueue,
    pub transform: StageQueue,
    pub publish: StageQueue,
}

impl PipelineQueues {
    /// All three queues share `capacity` (batches in flight per stage).
    pub fn new(capacity: usize) -> Self {
        Self {
            fetch: BoundedQueue::new(capacity),
            transform: BoundedQueue::new(capacity),
            publish: BoundedQueue::new(capacity),
        }
    }
}

/// Batches seen by the publisher (successful or not). Read from the progress sampler.
#[derive(Clone, Debug, Default)]
pub struct BatchCounter(Arc<AtomicUsize>);

impl BatchCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next slot; returns the 1-based number of the batch just seen.
    pub(crate) fn advance(&self) -> usize {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

/// Put `handoff` on `output`. Returns false when the downstream queue was closed under us,
/// which ends the calling stage.
pub(crate) fn forward(output: &StageQueue, handoff: Handoff, log: &StageLog) -> bool {
    let id = handoff.batch_id();
    match output.put(handoff) {
        Ok(()) => true,
        Err(e) => {
            log.error(format_args!("Dropping batch #{}: {}", id, e));
            false
        }
    }
}

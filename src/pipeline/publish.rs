//! Stage 3: upload everything under `output/`, then reclaim the batch scratch tree.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::batch::{Batch, ItemError};
use super::context::{BatchCounter, Handoff, StageQueue};
use super::failure::{ErrorSink, FailureKind, FailureRecord};
use crate::RemoteId;
use crate::storage::RemoteStore;
use crate::utils::StageLog;

pub struct Publisher {
    input: StageQueue,
    sink: ErrorSink,
    store: Arc<dyn RemoteStore>,
    destination: RemoteId,
    max_tries: usize,
    counter: BatchCounter,
    log: StageLog,
}

impl Publisher {
    pub fn new(
        input: StageQueue,
        sink: ErrorSink,
        store: Arc<dyn RemoteStore>,
        destination: RemoteId,
        max_tries: usize,
    ) -> Self {
        Self {
            input,
            sink,
            store,
            destination,
            max_tries,
            counter: BatchCounter::new(),
            log: StageLog::PUBLISH,
        }
    }

    /// Handle on the per-batch counter. Clone it before [`Publisher::spawn`] to sample progress.
    pub fn counter(&self) -> BatchCounter {
        self.counter.clone()
    }

    pub fn spawn(self) -> JoinHandle<usize> {
        thread::spawn(move || self.run())
    }

    /// Returns the number of batches seen, failed ones included.
    pub fn run(self) -> usize {
        while let Ok(handoff) = self.input.get() {
            // Every hand-off claims a slot so failures still count as seen.
            let n = self.counter.advance();
            match handoff {
                Handoff::Skipped(id) => {
                    self.log
                        .info(format_args!("Batch #{} is empty due to a previous error", id));
                }
                Handoff::Ready(batch) => self.publish_batch(batch, n),
            }
        }
        let seen = self.counter.get();
        self.log.debug(format_args!("Publish stage done ({} batches)", seen));
        seen
    }

    fn publish_batch(&self, batch: Batch, n: usize) {
        let id = batch.id();
        if let Err(detail) = self.upload_outputs(&batch) {
            let failure = FailureRecord::new(batch, FailureKind::UploadFailed, detail);
            self.log.error(format_args!("{}", failure.message()));
            self.sink.record(failure);
            return;
        }
        let root = batch.root().to_path_buf();
        if let Err(e) = batch.cleanup() {
            self.log.warn(format_args!(
                "Could not remove scratch directory {}: {}",
                root.display(),
                e
            ));
        }
        self.log
            .info(format_args!("Batch #{} uploaded ({} seen)", id, n));
    }

    /// Stops at the first item that fails; remaining outputs of the batch are left in place.
    fn upload_outputs(&self, batch: &Batch) -> Result<(), String> {
        let outputs = batch
            .collect_outputs(&self.destination)
            .map_err(|e| format!("scan {}: {}", batch.output_path().display(), e))?;
        for mut item in outputs {
            self.log.debug(format_args!(
                "Uploading {} to {}",
                item.local_path().display(),
                item.remote
            ));
            item.upload(self.store.as_ref(), self.max_tries)
                .and_then(|()| item.remove_local())
                .map_err(|e: ItemError| format!("{}: {}", item.remote, e))?;
        }
        Ok(())
    }
}

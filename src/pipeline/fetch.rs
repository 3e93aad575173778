//! Stage 1: download every input of a batch into its `input/` directory.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::batch::{Batch, ItemError};
use super::context::{Handoff, StageQueue, forward};
use super::failure::{ErrorSink, FailureKind, FailureRecord};
use crate::storage::RemoteStore;
use crate::utils::StageLog;

pub struct Fetcher {
    input: StageQueue,
    output: StageQueue,
    sink: ErrorSink,
    store: Arc<dyn RemoteStore>,
    max_tries: usize,
    log: StageLog,
}

impl Fetcher {
    pub fn new(
        input: StageQueue,
        output: StageQueue,
        sink: ErrorSink,
        store: Arc<dyn RemoteStore>,
        max_tries: usize,
    ) -> Self {
        Self {
            input,
            output,
            sink,
            store,
            max_tries,
            log: StageLog::FETCH,
        }
    }

    /// Run the stage on its own thread. The handle yields the number of hand-offs processed.
    pub fn spawn(self) -> JoinHandle<usize> {
        thread::spawn(move || self.run())
    }

    /// Drain the input queue until it is closed and empty, then close the output queue.
    pub fn run(self) -> usize {
        let mut handled = 0_usize;
        while let Ok(handoff) = self.input.get() {
            handled += 1;
            let next = match handoff {
                Handoff::Skipped(id) => {
                    self.log
                        .debug(format_args!("Batch #{} failed upstream, passing on", id));
                    Handoff::Skipped(id)
                }
                Handoff::Ready(batch) => self.fetch_batch(batch),
            };
            if !forward(&self.output, next, &self.log) {
                break;
            }
        }
        self.output.close();
        self.log.debug(format_args!("Fetch stage done ({} batches)", handled));
        handled
    }

    fn fetch_batch(&self, mut batch: Batch) -> Handoff {
        let id = batch.id();
        self.log.info(format_args!(
            "Downloading batch #{} ({} inputs) into {}",
            id,
            batch.inputs().len(),
            batch.input_path().display()
        ));
        match self.download_all(&mut batch) {
            Ok(()) => Handoff::Ready(batch),
            Err(e) => {
                let failure = FailureRecord::new(batch, FailureKind::DownloadFailed, e);
                self.log.error(format_args!("{}", failure.message()));
                self.sink.record(failure);
                Handoff::Skipped(id)
            }
        }
    }

    /// Stops at the first item that exhausts its retries; the whole batch fails with it.
    fn download_all(&self, batch: &mut Batch) -> Result<(), String> {
        for item in batch.inputs_mut() {
            item.download(self.store.as_ref(), self.max_tries)
                .map_err(|e: ItemError| format!("{}: {}", item.remote, e))?;
            self.log.debug(format_args!(
                "Downloaded {} to {}",
                item.remote,
                item.local_path().display()
            ));
        }
        Ok(())
    }
}

//! Stage 2: run the external program on each batch; inputs are consumed on success.

use std::fs;
use std::thread::{self, JoinHandle};

use super::batch::Batch;
use super::context::{Handoff, StageQueue, forward};
use super::failure::{ErrorSink, FailureKind, FailureRecord};
use crate::engine::program::Program;
use crate::utils::StageLog;

pub struct Transformer {
    input: StageQueue,
    output: StageQueue,
    sink: ErrorSink,
    program: Program,
    log: StageLog,
}

impl Transformer {
    pub fn new(input: StageQueue, output: StageQueue, sink: ErrorSink, program: Program) -> Self {
        Self {
            input,
            output,
            sink,
            program,
            log: StageLog::TRANSFORM,
        }
    }

    pub fn spawn(self) -> JoinHandle<usize> {
        thread::spawn(move || self.run())
    }

    /// Same termination contract as the fetch stage: exit on closed + empty, then close output.
    pub fn run(self) -> usize {
        let mut handled = 0_usize;
        while let Ok(handoff) = self.input.get() {
            handled += 1;
            let next = match handoff {
                Handoff::Skipped(id) => {
                    self.log
                        .info(format_args!("Batch #{} is empty due to a previous error", id));
                    Handoff::Skipped(id)
                }
                Handoff::Ready(batch) => self.transform_batch(batch),
            };
            if !forward(&self.output, next, &self.log) {
                break;
            }
        }
        self.output.close();
        self.log
            .debug(format_args!("Transform stage done ({} batches)", handled));
        handled
    }

    fn transform_batch(&self, batch: Batch) -> Handoff {
        let id = batch.id();
        let working_dir = batch.root().to_path_buf();
        let input_dir = batch.input_path();
        self.log.info(format_args!(
            "Running {} on batch #{} in {}",
            self.program.path().display(),
            id,
            working_dir.display()
        ));

        let output = match self.program.run(&working_dir, &input_dir) {
            Ok(output) => output,
            Err(e) => return self.fail(batch, e.kind(), e),
        };
        if !output.stdout.trim().is_empty() {
            self.log
                .debug(format_args!("batch #{} stdout: {}", id, output.stdout.trim()));
        }
        if !output.stderr.trim().is_empty() {
            self.log
                .debug(format_args!("batch #{} stderr: {}", id, output.stderr.trim()));
        }

        self.log.info(format_args!(
            "Finished batch #{}, removing input {}",
            id,
            input_dir.display()
        ));
        if let Err(e) = fs::remove_dir_all(&input_dir) {
            return self.fail(
                batch,
                FailureKind::TransformFailed,
                format!("remove consumed input {}: {}", input_dir.display(), e),
            );
        }
        Handoff::Ready(batch)
    }

    fn fail(&self, batch: Batch, kind: FailureKind, detail: impl std::fmt::Display) -> Handoff {
        let id = batch.id();
        let failure = FailureRecord::new(batch, kind, detail);
        self.log.error(format_args!("{}", failure.message()));
        self.sink.record(failure);
        Handoff::Skipped(id)
    }
}

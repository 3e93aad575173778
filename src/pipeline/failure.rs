//! Failure records, the error sink they are filed into, and the end-of-run report.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::fmt;
use std::io;
use std::path::Path;

use super::batch::Batch;
use crate::RemoteId;

/// Why a batch reached a terminal failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    DownloadFailed,
    TransformFailed,
    ProgramNotFound,
    PermissionDenied,
    UploadFailed,
    ScratchCreationFailed,
}

impl FailureKind {
    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::DownloadFailed => "Failed to download the inputs",
            FailureKind::TransformFailed => "The script exited with an error",
            FailureKind::ProgramNotFound => "The script (or its interpreter) was not found",
            FailureKind::PermissionDenied => "The script is not executable",
            FailureKind::UploadFailed => "Failed to upload the outputs",
            FailureKind::ScratchCreationFailed => "Failed to create the scratch directory",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Terminal failure of one batch. Owns the batch's scratch storage from the moment it is created.
#[derive(Debug)]
pub struct FailureRecord {
    batch_id: usize,
    kind: FailureKind,
    detail: String,
    inputs: Vec<RemoteId>,
    batch: Option<Batch>,
}

impl FailureRecord {
    pub fn new(batch: Batch, kind: FailureKind, detail: impl fmt::Display) -> Self {
        Self {
            batch_id: batch.id(),
            kind,
            detail: detail.to_string(),
            inputs: batch.input_identities(),
            batch: Some(batch),
        }
    }

    /// Failure with no scratch tree behind it (the batch could not be built).
    pub fn without_batch(
        batch_id: usize,
        inputs: Vec<RemoteId>,
        kind: FailureKind,
        detail: impl fmt::Display,
    ) -> Self {
        Self {
            batch_id,
            kind,
            detail: detail.to_string(),
            inputs,
            batch: None,
        }
    }

    pub fn batch_id(&self) -> usize {
        self.batch_id
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn batch(&self) -> Option<&Batch> {
        self.batch.as_ref()
    }

    pub fn scratch_root(&self) -> Option<&Path> {
        self.batch.as_ref().map(Batch::root)
    }

    pub fn message(&self) -> String {
        format!("{} (batch #{}): {}", self.kind, self.batch_id, self.detail)
    }

    pub fn input_identities(&self) -> &[RemoteId] {
        &self.inputs
    }

    /// Release the scratch storage of the failed batch, if there is any.
    pub fn cleanup(self) -> io::Result<()> {
        match self.batch {
            Some(batch) => batch.cleanup(),
            None => Ok(()),
        }
    }
}

/// Append-only collection of failures shared by every stage. Recording never blocks.
#[derive(Clone)]
pub struct ErrorSink {
    tx: Sender<FailureRecord>,
    rx: Receiver<FailureRecord>,
}

impl Default for ErrorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorSink {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn record(&self, failure: FailureRecord) {
        // Cannot fail: this sink holds its own receiver.
        let _ = self.tx.send(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Take every recorded failure, in recording order. Controller only, after the stages joined.
    pub fn drain(&self) -> Vec<FailureRecord> {
        self.rx.try_iter().collect()
    }
}

/// Human-readable report: one block per failure, then a count. `None` when nothing failed.
pub fn render_report(failures: &[FailureRecord]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }
    let mut message = String::from("The following errors occurred:\n\n");
    for failure in failures {
        message.push_str(&format!("Error: {}\n", failure.message()));
        message.push_str("\tError occurred for the following inputs:\n");
        for id in failure.input_identities() {
            message.push_str(&format!("\t\t{}\n", id));
        }
        message.push('\n');
    }
    let n = failures.len();
    message.push_str(&format!(
        "{} batch{} failed",
        n,
        if n == 1 { "" } else { "es" }
    ));
    Some(message)
}

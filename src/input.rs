//! Enumerate input identities and split them into batches.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::{Batch, ErrorSink, FailureKind, FailureRecord, Handoff, StageQueue};
use crate::storage::RemoteStore;
use crate::utils::StageLog;
use crate::{InputSource, RemoteId};

/// Identities listed one per line in `path`. Lines are trimmed; blank lines are skipped.
pub fn scan_input_file(path: &Path) -> Result<Vec<RemoteId>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read input list {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(RemoteId::from)
        .collect())
}

/// Objects directly inside `container`. Sub-containers are rejected by the store.
pub fn list_collection(store: &dyn RemoteStore, container: &RemoteId) -> Result<Vec<RemoteId>> {
    store
        .list(container)
        .with_context(|| format!("list collection {}", container))
}

/// Resolve an [`InputSource`] to the ordered list of identities to process.
pub fn enumerate_inputs(store: &dyn RemoteStore, source: &InputSource) -> Result<Vec<RemoteId>> {
    match source {
        InputSource::Collection(container) => list_collection(store, container),
        InputSource::ListFile(path) => scan_input_file(path),
    }
}

/// Split `ids` into consecutive groups of `batch_size` (the last one may be shorter).
/// `batch_size` of 0 is treated as 1.
pub fn plan_batches(ids: Vec<RemoteId>, batch_size: usize) -> Vec<Vec<RemoteId>> {
    let size = batch_size.max(1);
    let mut groups = Vec::with_capacity(ids.len().div_ceil(size));
    let mut iter = ids.into_iter().peekable();
    while iter.peek().is_some() {
        groups.push(iter.by_ref().take(size).collect());
    }
    groups
}

/// Batches to submit, plus where their scratch roots go. Scratch trees are created lazily
/// by [`feed_batches`] so only in-flight batches occupy disk.
#[derive(Clone, Debug, Default)]
pub struct BatchPlan {
    pub groups: Vec<Vec<RemoteId>>,
    pub scratch_location: Option<PathBuf>,
}

impl BatchPlan {
    pub fn new(ids: Vec<RemoteId>, batch_size: usize, scratch_location: Option<PathBuf>) -> Self {
        Self {
            groups: plan_batches(ids, batch_size),
            scratch_location,
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

/// Build one batch per group and put it on `queue`, then close `queue`.
/// A batch whose scratch tree cannot be created is recorded and replaced by a placeholder.
/// Returns the number of hand-offs submitted.
pub fn feed_batches(plan: BatchPlan, queue: &StageQueue, sink: &ErrorSink) -> usize {
    let log = StageLog::FEED;
    let scratch = plan.scratch_location.as_deref();
    let mut submitted = 0_usize;
    for (id, group) in plan.groups.into_iter().enumerate() {
        let handoff = match Batch::new(id, scratch) {
            Ok(mut batch) => {
                for remote in group {
                    log.debug(format_args!("Adding {} to batch #{}", remote.name(), id));
                    batch.add_input(remote);
                }
                Handoff::Ready(batch)
            }
            Err(e) => {
                let failure =
                    FailureRecord::without_batch(id, group, FailureKind::ScratchCreationFailed, e);
                log.error(format_args!("{}", failure.message()));
                sink.record(failure);
                Handoff::Skipped(id)
            }
        };
        if let Err(e) = queue.put(handoff) {
            log.error(format_args!("Stopped feeding at batch #{}: {}", id, e));
            break;
        }
        submitted += 1;
    }
    queue.close();
    log.debug(format_args!("Submitted {} batches", submitted));
    submitted
}

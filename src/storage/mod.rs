//! Remote store collaborator: the operations the pipeline needs from object storage.

pub mod local;

use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::RemoteId;
use crate::utils::config::RETRY_DELAY;

pub use local::LocalStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} does not exist")]
    NotFound(RemoteId),

    #[error("{0}")]
    NotImplemented(String),

    #[error("gave up after {tries} attempt(s): {source}")]
    Exhausted {
        tries: usize,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Object storage as seen by the pipeline. Implementations must be shareable across the
/// stage threads.
pub trait RemoteStore: Send + Sync {
    /// Identities directly inside `container`, in a stable order. Sub-containers are an error.
    fn list(&self, container: &RemoteId) -> Result<Vec<RemoteId>, StoreError>;

    /// Download `id` to `local`, attempting up to `tries` times.
    fn fetch(&self, id: &RemoteId, local: &Path, tries: usize) -> Result<(), StoreError>;

    /// Upload `local` as `id`, attempting up to `tries` times.
    fn store(&self, id: &RemoteId, local: &Path, tries: usize) -> Result<(), StoreError>;

    /// Pre-flight check for source and destination containers.
    fn exists(&self, id: &RemoteId) -> bool;
}

/// Attempts and spacing for one transfer.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { delay: RETRY_DELAY }
    }
}

impl RetryPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Run `op` until it succeeds or `tries` attempts have failed. Sleeps `delay` between attempts.
    pub fn run<F>(&self, tries: usize, mut op: F) -> Result<(), StoreError>
    where
        F: FnMut() -> io::Result<()>,
    {
        let tries = tries.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= tries => {
                    return Err(StoreError::Exhausted { tries, source: e });
                }
                Err(e) => {
                    log::debug!("attempt {}/{} failed: {}", attempt, tries, e);
                    attempt += 1;
                    thread::sleep(self.delay);
                }
            }
        }
    }
}

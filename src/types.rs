//! Public types shared by the CLI and the pipeline: remote identities and run options.

use anyhow::{Result, bail};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::utils::config::PipelineDefaults;

/// Opaque handle of one object (or container) in the remote store.
///
/// Identities are `/`-separated; the last segment is the object's name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base name: the last non-empty `/` segment.
    pub fn name(&self) -> &str {
        self.0
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.0)
    }

    /// Identity of `name` inside this container.
    pub fn join(&self, name: &str) -> RemoteId {
        RemoteId(format!("{}/{}", self.0.trim_end_matches('/'), name))
    }

    /// Filesystem view of the identity (for directory-backed stores).
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RemoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Where the run's input identities come from.
#[derive(Clone, Debug)]
pub enum InputSource {
    /// Every object directly inside this container.
    Collection(RemoteId),
    /// A local file with one identity per line.
    ListFile(PathBuf),
}

/// Pipeline options (CLI, `.transponster.toml`, or lib caller).
#[derive(Clone, Debug)]
pub struct Opts {
    /// Parent directory for batch scratch roots. When None, the system temp dir.
    pub scratch_location: Option<PathBuf>,
    /// Capacity of each inter-stage queue (batches in flight per stage).
    pub max_items_per_stage: usize,
    /// Remote identities per batch.
    pub batch_size: usize,
    /// Attempts per item download/upload.
    pub max_tries: usize,
    /// Show a progress bar fed by the publisher counter.
    pub progress_bar: bool,
    /// Debug-level logging for this crate.
    pub verbose: bool,
    /// Leave scratch directories of failed batches on disk for inspection.
    pub keep_failed_scratch: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            scratch_location: None,
            max_items_per_stage: PipelineDefaults::MAX_ITEMS_PER_STAGE,
            batch_size: PipelineDefaults::BATCH_SIZE,
            max_tries: PipelineDefaults::MAX_TRIES,
            progress_bar: false,
            verbose: false,
            keep_failed_scratch: false,
        }
    }
}

impl Opts {
    /// Reject settings that would make the pipeline meaningless. Startup-time only.
    pub fn validate(&self) -> Result<()> {
        if self.max_items_per_stage == 0 {
            bail!("max_items_per_stage must be strictly positive");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be strictly positive");
        }
        if self.max_tries == 0 {
            bail!("max_tries must be strictly positive");
        }
        if let Some(dir) = &self.scratch_location
            && !dir.is_dir()
        {
            bail!("scratch location {} is not a directory", dir.display());
        }
        Ok(())
    }
}

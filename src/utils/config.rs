//! Application configuration constants.
//! Tuning and defaults in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    scratch_prefix: String,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                scratch_prefix: format!("{pkg}-"),
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    /// Prefix of every batch scratch directory (e.g. `transponster-a1B2c3`).
    pub fn scratch_prefix(&self) -> &str {
        &self.scratch_prefix
    }

    /// Optional settings file looked up in the current directory.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Batch layout ----

/// Names of the two children created in every batch scratch root.
pub struct ScratchLayout;

impl ScratchLayout {
    pub const INPUT_DIR: &'static str = "input";
    /// The transform program writes its results here. Name is part of the program contract.
    pub const OUTPUT_DIR: &'static str = "output";
}

// ---- Pipeline defaults ----

/// Defaults for the user-facing pipeline settings.
pub struct PipelineDefaults;

impl PipelineDefaults {
    /// Batches buffered between two stages.
    pub const MAX_ITEMS_PER_STAGE: usize = 1;
    /// Remote identities grouped into one batch.
    pub const BATCH_SIZE: usize = 1;
    /// Attempts per item transfer before the batch is failed.
    pub const MAX_TRIES: usize = 5;
}

// ---- Retry ----

/// Fixed delay between two transfer attempts of the same item.
pub const RETRY_DELAY: Duration = Duration::from_millis(200);

// ---- Progress ----

/// How often the sampler thread reads the publisher counter.
pub const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(500);

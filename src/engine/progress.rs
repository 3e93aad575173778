//! Progress bar utilities for displaying batches seen by the publish stage

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    /// Create a new progress bar configuration
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

/// Create a progress bar with the given configuration
pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " batches"
    )))
}

/// Percentage bar over the number of submitted batches.
pub fn create_batch_bar(total: usize) -> ProgressBar {
    let bar = create_progress_bar(ProgressBarConfig::new(
        total,
        "Transponding",
        Animation::Classic,
    ));
    refresh_bar(&bar);
    bar
}

/// Force a refresh of the bar (e.g. so it shows "0/N" immediately).
pub fn refresh_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.refresh();
    }
}

/// Update progress bar if available
/// Uses try_lock to avoid blocking if mutex is contended (non-blocking)
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Final refresh and newline so later log lines start on their own row.
pub fn finish_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.lock() {
        let _ = bar.refresh();
        eprintln!();
    }
}

//! Transponster: fetch files from a remote collection in batches, run a program on each
//! batch, and publish the results, with one bounded queue between each pair of stages.

pub mod engine;
pub mod input;
pub mod pipeline;
pub mod storage;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use log::debug;
use std::sync::Arc;

use crate::engine::Program;
use crate::input::{BatchPlan, enumerate_inputs};
use crate::pipeline::{Controller, PipelineConfig, RunReport};
use crate::storage::RemoteStore;

/// Result alias used by public transponster API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point for lib callers: enumerate `source`, batch it per `opts`, run every
/// batch through `program`, and upload outputs to `destination`.
///
/// Failed batches are not an `Err`: they are listed in [`RunReport::failures`]. The caller
/// owns their scratch trees (see [`FailureRecord::cleanup`](crate::pipeline::FailureRecord::cleanup)).
///
/// ```ignore
/// let store = Arc::new(transponster::storage::LocalStore::new());
/// let report = transponster::transpond(store, &source, &"out".into(), Program::new("x.sh"), &Opts::default())?;
/// assert!(report.is_success());
/// ```
pub fn transpond(
    store: Arc<dyn RemoteStore>,
    source: &InputSource,
    destination: &RemoteId,
    program: Program,
    opts: &Opts,
) -> Result<RunReport> {
    opts.validate()?;
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    let ids = enumerate_inputs(store.as_ref(), source)?;
    let plan = BatchPlan::new(ids, opts.batch_size, opts.scratch_location.clone());
    let controller = Controller::new(
        PipelineConfig::from_opts(destination.clone(), opts),
        store,
        program,
    );
    controller.run(plan)
}

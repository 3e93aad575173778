//! CLI command handler: validate, enumerate, run the pipeline, report.

use anyhow::{Result, bail};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

use crate::engine::arg_parser::Cli;
use crate::engine::program::Program;
use crate::input::{BatchPlan, enumerate_inputs};
use crate::pipeline::{Controller, PipelineConfig};
use crate::storage::{LocalStore, RemoteStore};
use crate::utils::setup_logging;
use crate::utils::transponster_toml::{apply_file_to_opts, load_transponster_toml};
use crate::{InputSource, Opts, RemoteId};

/// Defaults, then `.transponster.toml` in `config_dir`, then CLI flags.
pub fn setup_opts(cli: &Cli, config_dir: &Path) -> Opts {
    let mut opts = Opts::default();
    if let Some(file) = load_transponster_toml(config_dir) {
        apply_file_to_opts(&file, &mut opts);
    }
    if let Some(ref p) = cli.scratch_location {
        opts.scratch_location = Some(p.clone());
    }
    if let Some(n) = cli.max_items_per_stage {
        opts.max_items_per_stage = n;
    }
    if let Some(n) = cli.batch_size {
        opts.batch_size = n;
    }
    if let Some(n) = cli.max_tries {
        opts.max_tries = n;
    }
    if let Some(v) = cli.progress_bar {
        opts.progress_bar = v;
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    if let Some(v) = cli.keep_failed_scratch {
        opts.keep_failed_scratch = v;
    }
    opts
}

pub fn input_source(cli: &Cli) -> Result<InputSource> {
    match (&cli.input_collection, &cli.input_list_file) {
        (Some(c), None) => Ok(InputSource::Collection(RemoteId::new(c.as_str()))),
        (None, Some(f)) => Ok(InputSource::ListFile(f.clone())),
        _ => bail!("exactly one of --input-collection or --input-list-file is required"),
    }
}

/// Startup checks that abort the run before any batch exists.
fn preflight(
    store: &dyn RemoteStore,
    source: &InputSource,
    output: &RemoteId,
    program: &Program,
) -> Result<()> {
    program.check()?;
    if let InputSource::Collection(c) = source
        && !store.exists(c)
    {
        bail!("Error: Input Collection {} does not exist.", c);
    }
    if !store.exists(output) {
        bail!("Error: Output Collection {} does not exist.", output);
    }
    Ok(())
}

/// Run the whole transfer described by `cli`. Errors when startup validation fails or
/// when any batch failed.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli, Path::new("."));
    setup_logging(opts.verbose);
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    opts.validate()?;

    let store: Arc<dyn RemoteStore> = Arc::new(LocalStore::new());
    let source = input_source(cli)?;
    let output = RemoteId::new(cli.output_collection.as_str());
    let program = Program::resolve(&cli.script)?;
    preflight(store.as_ref(), &source, &output, &program)?;

    let ids = enumerate_inputs(store.as_ref(), &source)?;
    let plan = BatchPlan::new(ids, opts.batch_size, opts.scratch_location.clone());
    info!(
        "{} inputs in {} batches of up to {}",
        plan.item_count(),
        plan.len(),
        opts.batch_size
    );

    let controller = Controller::new(PipelineConfig::from_opts(output, &opts), store, program);
    let report = controller.run(plan)?;
    let failed = controller.finish(report)?;
    if failed > 0 {
        bail!("{} batch(es) failed", failed);
    }
    Ok(())
}

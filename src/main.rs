//! Transponster CLI: fetch, transform and publish remote files in batches.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use transponster::engine::arg_parser::Cli;
use transponster::engine::handle_run;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}

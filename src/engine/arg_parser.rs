use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Execute a script on batches of files from a remote collection and upload the results.
#[derive(Clone, Parser)]
#[command(name = "transponster")]
#[command(about = "Execute a script on files stored remotely. \
The script must take as input a folder, and place its output in \
a folder named 'output' which will be created for it.")]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["input_collection", "input_list_file"]),
))]
pub struct Cli {
    /// Collection whose objects are processed.
    #[arg(long, short = 'i', value_name = "COLLECTION")]
    pub input_collection: Option<String>,

    /// File with one remote object path per line.
    #[arg(long, short = 'f', value_name = "FILE")]
    pub input_list_file: Option<PathBuf>,

    /// Collection the outputs are uploaded to.
    #[arg(long, short = 'o', value_name = "COLLECTION")]
    pub output_collection: String,

    /// Program run once per batch (argument: the batch input folder).
    #[arg(long, short = 's', value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Directory under which batch scratch folders are created. Default: system temp dir.
    #[arg(long)]
    pub scratch_location: Option<PathBuf>,

    /// Batches buffered between two stages.
    #[arg(long, short = 'n')]
    pub max_items_per_stage: Option<usize>,

    /// Number of input objects per batch.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Attempts per download/upload before the batch is failed.
    #[arg(long)]
    pub max_tries: Option<usize>,

    /// Show a progress bar.
    #[arg(long, short = 'p', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub progress_bar: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Leave scratch folders of failed batches on disk for inspection.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub keep_failed_scratch: Option<bool>,
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::Result;

use crate::engine::program::Program;
use crate::engine::progress::{self, ProgressBar};
use crate::input::{BatchPlan, feed_batches};
use crate::pipeline::{
    BatchCounter, ErrorSink, FailureRecord, Fetcher, PipelineQueues, Publisher, Transformer,
    render_report,
};
use crate::storage::RemoteStore;
use crate::utils::StageLog;
use crate::utils::config::PROGRESS_POLL_INTERVAL;
use crate::{Opts, RemoteId};

/// Settings the controller needs beyond the collaborators.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub destination: RemoteId,
    pub max_items_per_stage: usize,
    pub max_tries: usize,
    pub progress_bar: bool,
    pub keep_failed_scratch: bool,
}

impl PipelineConfig {
    pub fn from_opts(destination: RemoteId, opts: &Opts) -> Self {
        Self {
            destination,
            max_items_per_stage: opts.max_items_per_stage,
            max_tries: opts.max_tries,
            progress_bar: opts.progress_bar,
            keep_failed_scratch: opts.keep_failed_scratch,
        }
    }
}

/// Outcome of one run.
#[derive(Debug)]
pub struct RunReport {
    /// Batches put on the fetch queue.
    pub submitted: usize,
    /// Batches that reached the publisher (failed ones included).
    pub seen: usize,
    pub failures: Vec<FailureRecord>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn published(&self) -> usize {
        self.seen.saturating_sub(self.failures.len())
    }

    pub fn render(&self) -> Option<String> {
        render_report(&self.failures)
    }
}

/// Wires the three stages and runs a plan through them.
pub struct Controller {
    config: PipelineConfig,
    store: Arc<dyn RemoteStore>,
    program: Program,
    log: StageLog,
}

impl Controller {
    pub fn new(config: PipelineConfig, store: Arc<dyn RemoteStore>, program: Program) -> Self {
        Self {
            config,
            store,
            program,
            log: StageLog::CONTROLLER,
        }
    }

    /// Run every batch in `plan` through fetch → transform → publish. Returns once all stages
    /// have drained. Failed batches do not stop the run; they are returned in the report.
    pub fn run(&self, plan: BatchPlan) -> Result<RunReport> {
        let total = plan.len();
        let queues = PipelineQueues::new(self.config.max_items_per_stage);
        let sink = ErrorSink::new();

        let feed_queue = queues.fetch.clone();
        let feed_sink = sink.clone();
        let feeder = thread::spawn(move || feed_batches(plan, &feed_queue, &feed_sink));

        let fetcher = Fetcher::new(
            queues.fetch.clone(),
            queues.transform.clone(),
            sink.clone(),
            Arc::clone(&self.store),
            self.config.max_tries,
        )
        .spawn();
        let transformer = Transformer::new(
            queues.transform.clone(),
            queues.publish.clone(),
            sink.clone(),
            self.program.clone(),
        )
        .spawn();
        let publisher = Publisher::new(
            queues.publish.clone(),
            sink.clone(),
            Arc::clone(&self.store),
            self.config.destination.clone(),
            self.config.max_tries,
        );
        let counter = publisher.counter();
        let publisher = publisher.spawn();

        let done = Arc::new(AtomicBool::new(false));
        let sampler = self
            .config
            .progress_bar
            .then(|| spawn_progress_sampler(total, counter.clone(), Arc::clone(&done)));

        // Join in pipeline order; each stage closes its output queue on exit.
        let submitted = join_stage(feeder, "feeder")?;
        self.log.debug(format_args!("Feeder done"));
        join_stage(fetcher, "fetch")?;
        self.log.debug(format_args!("Fetch stage joined"));
        join_stage(transformer, "transform")?;
        self.log.debug(format_args!("Transform stage joined"));
        let seen = join_stage(publisher, "publish")?;
        self.log.debug(format_args!("Publish stage joined"));

        done.store(true, Ordering::Release);
        if let Some(sampler) = sampler {
            let _ = sampler.join();
        }

        let failures = sink.drain();
        Ok(RunReport {
            submitted,
            seen,
            failures,
        })
    }

    /// Log the report: success line, or every failure block followed by the count.
    /// Then release (or keep, when configured) scratch trees of failed batches.
    pub fn finish(&self, report: RunReport) -> Result<usize> {
        let Some(message) = report.render() else {
            self.log
                .info(format_args!("All jobs completed successfully!"));
            return Ok(0);
        };
        self.log.error(format_args!("{}", message));
        let failed = report.failures.len();
        for failure in report.failures {
            if self.config.keep_failed_scratch {
                if let Some(root) = failure.scratch_root() {
                    self.log.info(format_args!(
                        "Kept scratch for batch #{} at {}",
                        failure.batch_id(),
                        root.display()
                    ));
                }
                continue;
            }
            let id = failure.batch_id();
            if let Err(e) = failure.cleanup() {
                self.log
                    .warn(format_args!("Could not clean scratch of batch #{}: {}", id, e));
            }
        }
        Ok(failed)
    }
}

fn join_stage<T>(handle: JoinHandle<T>, name: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("{} thread panicked", name))
}

/// Poll the publisher counter until `done`, mirroring it on a progress bar.
fn spawn_progress_sampler(
    total: usize,
    counter: BatchCounter,
    done: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let bar: ProgressBar = progress::create_batch_bar(total);
        let mut shown = 0_usize;
        loop {
            let finished = done.load(Ordering::Acquire);
            let now = counter.get();
            if now > shown {
                progress::update_progress_bar(&bar, now - shown);
                shown = now;
            }
            if finished {
                break;
            }
            thread::sleep(PROGRESS_POLL_INTERVAL);
        }
        progress::finish_bar(&bar);
    })
}

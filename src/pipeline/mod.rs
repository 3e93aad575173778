//! Pipeline components: queue, batch, failure records, the three stages and the controller.

pub mod batch;
pub mod context;
pub mod failure;
pub mod fetch;
pub mod orchestrator;
pub mod publish;
pub mod queue;
pub mod transform;

pub use batch::{Batch, Item, ItemError};
pub use context::{BatchCounter, Handoff, PipelineQueues, StageQueue};
pub use failure::{ErrorSink, FailureKind, FailureRecord, render_report};
pub use fetch::Fetcher;
pub use orchestrator::{Controller, PipelineConfig, RunReport};
pub use publish::Publisher;
pub use queue::{BoundedQueue, QueueError};
pub use transform::Transformer;

//! Step-ordered batch framework
//!
//! A [`Job`] runs an ordered list of [`Step`]s. Steps are either single-shot
//! [`Tasklet`]s or [`ChunkStep`]s that move items from an [`ItemReader`]
//! through an optional [`ItemProcessor`] into an [`ItemWriter`] in
//! fixed-size, individually committed chunks. Execution state is captured in
//! a [`JobExecution`] that the caller can inspect after the run.

pub mod chunk;
pub mod item;
pub mod job;
pub mod parameters;
pub mod skip;
pub mod step;
pub mod types;

// Re-export commonly used types
pub use chunk::{ChunkStep, DEFAULT_CHUNK_SIZE};
pub use item::{ItemProcessor, ItemReader, ItemWriter, PassThrough};
pub use job::{Job, JobBuilder, JobParametersValidator};
pub use parameters::{JobParameter, JobParameters, JobParametersBuilder};
pub use skip::{FileSkipSink, MemorySkipSink, SkipSink};
pub use step::{Step, StepContext, Tasklet, TaskletStep};
pub use types::{BatchStatus, JobExecution, JobFailure, StepExecution, StepKind};

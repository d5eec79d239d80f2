//! Step contract and the tasklet step

use async_trait::async_trait;
use uuid::Uuid;

use super::parameters::JobParameters;
use super::types::{StepExecution, StepKind};
use crate::error::{JobError, Result};

/// Read-only view of the running job handed to every step
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub job_name: &'a str,
    pub execution_id: Uuid,
    pub parameters: &'a JobParameters,
}

impl<'a> StepContext<'a> {
    pub fn new(job_name: &'a str, execution_id: Uuid, parameters: &'a JobParameters) -> Self {
        Self {
            job_name,
            execution_id,
            parameters,
        }
    }
}

/// One unit of a job's ordered step list
///
/// Implementations record progress on `execution` as they go so that the
/// counters survive a failure.
#[async_trait]
pub trait Step: Send {
    fn name(&self) -> &str;

    fn kind(&self) -> StepKind;

    async fn execute(&mut self, ctx: &StepContext<'_>, execution: &mut StepExecution) -> Result<()>;
}

/// Single-shot step action
#[async_trait]
pub trait Tasklet: Send {
    async fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()>;
}

/// Step that runs a [`Tasklet`] once and commits once on success
pub struct TaskletStep<T> {
    name: String,
    tasklet: T,
}

impl<T: Tasklet> TaskletStep<T> {
    pub fn new(name: impl Into<String>, tasklet: T) -> Self {
        Self {
            name: name.into(),
            tasklet,
        }
    }
}

#[async_trait]
impl<T: Tasklet> Step for TaskletStep<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Tasklet
    }

    async fn execute(&mut self, ctx: &StepContext<'_>, execution: &mut StepExecution) -> Result<()> {
        self.tasklet.execute(ctx).await.map_err(|err| match err {
            JobError::StepExecution(_) => err,
            other => JobError::step(other.to_string()),
        })?;
        execution.commit_count += 1;
        Ok(())
    }
}

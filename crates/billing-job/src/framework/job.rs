//! Job orchestrator
//!
//! Validates the parameters, then runs the declared steps strictly in order.
//! The first failing step ends the run; later steps stay pending.

use chrono::Utc;
use tracing::{error, info, warn};

use super::parameters::JobParameters;
use super::step::{Step, StepContext};
use super::types::{BatchStatus, JobExecution, JobFailure, StepExecution};
use crate::error::Result;

/// Guard evaluated before any step runs
pub trait JobParametersValidator: Send + Sync {
    fn validate(&self, parameters: &JobParameters) -> Result<()>;
}

/// Ordered sequence of steps run as one unit
pub struct Job {
    name: String,
    validator: Option<Box<dyn JobParametersValidator>>,
    steps: Vec<Box<dyn Step>>,
}

impl Job {
    pub fn builder(name: impl Into<String>) -> JobBuilder {
        JobBuilder {
            name: name.into(),
            validator: None,
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step names in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run the job once
    ///
    /// Always returns a terminal execution; failures are reported through
    /// [`JobExecution::status`] and [`JobExecution::failure`].
    pub async fn launch(&mut self, parameters: JobParameters) -> JobExecution {
        let step_executions = self
            .steps
            .iter()
            .map(|s| StepExecution::new(s.name(), s.kind()))
            .collect();
        let mut execution = JobExecution::new(&self.name, parameters, step_executions);
        execution.started_at = Some(Utc::now());

        info!(job = %self.name, execution_id = %execution.id, "Launching job");

        if let Some(validator) = &self.validator {
            if let Err(err) = validator.validate(&execution.parameters) {
                warn!(job = %self.name, error = %err, "Job parameters rejected");
                execution.status = BatchStatus::Failed;
                execution.failure = Some(JobFailure {
                    step_name: None,
                    commit_count: 0,
                    message: err.to_string(),
                });
                execution.ended_at = Some(Utc::now());
                return execution;
            }
        }

        execution.status = BatchStatus::Running;

        let failure = {
            let ctx = StepContext::new(&self.name, execution.id, &execution.parameters);
            run_steps(&mut self.steps, &ctx, &mut execution.steps).await
        };

        execution.status = if failure.is_some() {
            BatchStatus::Failed
        } else {
            BatchStatus::Completed
        };
        execution.failure = failure;
        execution.ended_at = Some(Utc::now());

        match &execution.failure {
            None => info!(job = %self.name, execution_id = %execution.id, "Job completed"),
            Some(failure) => error!(
                job = %self.name,
                execution_id = %execution.id,
                step = failure.step_name.as_deref().unwrap_or("-"),
                commits = failure.commit_count,
                "Job failed"
            ),
        }

        execution
    }
}

async fn run_steps(
    steps: &mut [Box<dyn Step>],
    ctx: &StepContext<'_>,
    executions: &mut [StepExecution],
) -> Option<JobFailure> {
    for (step, execution) in steps.iter_mut().zip(executions.iter_mut()) {
        execution.start();
        info!(step = %execution.step_name, kind = execution.kind.as_str(), "Step started");

        match step.execute(ctx, execution).await {
            Ok(()) => {
                execution.complete();
                info!(
                    step = %execution.step_name,
                    read = execution.read_count,
                    written = execution.write_count,
                    filtered = execution.filter_count,
                    skipped = execution.skip_count,
                    commits = execution.commit_count,
                    "Step completed"
                );
            },
            Err(err) => {
                execution.fail(&err);
                error!(
                    step = %execution.step_name,
                    commits = execution.commit_count,
                    error = %err,
                    "Step failed"
                );
                return Some(JobFailure {
                    step_name: Some(execution.step_name.clone()),
                    commit_count: execution.commit_count,
                    message: err.to_string(),
                });
            },
        }
    }

    None
}

/// Builder for Job
pub struct JobBuilder {
    name: String,
    validator: Option<Box<dyn JobParametersValidator>>,
    steps: Vec<Box<dyn Step>>,
}

impl JobBuilder {
    pub fn validator(mut self, validator: impl JobParametersValidator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Append a step; steps run in the order they are added
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn build(self) -> Job {
        Job {
            name: self.name,
            validator: self.validator,
            steps: self.steps,
        }
    }
}

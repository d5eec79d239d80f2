//! Execution state for jobs and steps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::parameters::JobParameters;
use crate::error::JobError;

/// Lifecycle status shared by jobs and steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Running => "running",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
        }
    }

    /// Whether the status can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a step processes its work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Tasklet,
    Chunked,
}

impl StepKind {
    pub fn as_str(&self) -> &str {
        match self {
            StepKind::Tasklet => "tasklet",
            StepKind::Chunked => "chunked",
        }
    }
}

/// Progress and outcome of one step within a job run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecution {
    pub step_name: String,
    pub kind: StepKind,
    pub status: BatchStatus,
    pub read_count: usize,
    pub write_count: usize,
    /// Items the processor dropped
    pub filter_count: usize,
    /// Items the skip policy recovered from
    pub skip_count: usize,
    /// Chunks (or tasklet runs) durably handed to the writer
    pub commit_count: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub failure: Option<String>,
}

impl StepExecution {
    pub fn new(step_name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            step_name: step_name.into(),
            kind,
            status: BatchStatus::Pending,
            read_count: 0,
            write_count: 0,
            filter_count: 0,
            skip_count: 0,
            commit_count: 0,
            started_at: None,
            ended_at: None,
            failure: None,
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = BatchStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn complete(&mut self) {
        self.status = BatchStatus::Completed;
        self.ended_at = Some(Utc::now());
    }

    pub(crate) fn fail(&mut self, error: &JobError) {
        self.status = BatchStatus::Failed;
        self.ended_at = Some(Utc::now());
        self.failure = Some(error.to_string());
    }
}

/// Where and why a job run stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    /// Failed step; `None` when the parameters were rejected before any step ran
    pub step_name: Option<String>,
    /// Chunks the failed step had committed before it stopped
    pub commit_count: usize,
    pub message: String,
}

/// One run of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecution {
    pub id: Uuid,
    pub job_name: String,
    pub parameters: JobParameters,
    pub status: BatchStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// One entry per declared step, in declaration order
    pub steps: Vec<StepExecution>,
    pub failure: Option<JobFailure>,
}

impl JobExecution {
    pub fn new(job_name: impl Into<String>, parameters: JobParameters, steps: Vec<StepExecution>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_name: job_name.into(),
            parameters,
            status: BatchStatus::Pending,
            started_at: None,
            ended_at: None,
            steps,
            failure: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == BatchStatus::Completed
    }

    /// Look up a step execution by name
    pub fn step(&self, name: &str) -> Option<&StepExecution> {
        self.steps.iter().find(|s| s.step_name == name)
    }

    /// Number of steps that left the pending state
    pub fn executed_step_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status != BatchStatus::Pending)
            .count()
    }

    /// Name of the step that failed, if any
    pub fn failed_step(&self) -> Option<&str> {
        self.failure.as_ref().and_then(|f| f.step_name.as_deref())
    }
}

impl std::fmt::Display for JobExecution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Job {} [{}]: {}", self.job_name, self.id, self.status)?;
        for step in &self.steps {
            writeln!(
                f,
                "  {:<22} {:<9} read={} written={} filtered={} skipped={} commits={}",
                step.step_name,
                step.status,
                step.read_count,
                step.write_count,
                step.filter_count,
                step.skip_count,
                step.commit_count
            )?;
        }
        if let Some(failure) = &self.failure {
            match &failure.step_name {
                Some(step) => write!(
                    f,
                    "  failed at step '{}' after {} committed chunk(s): {}",
                    step, failure.commit_count, failure.message
                )?,
                None => write!(f, "  rejected before any step ran: {}", failure.message)?,
            }
        }
        Ok(())
    }
}

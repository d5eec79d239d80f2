//! Error types for the billing batch job
//!
//! Errors fall in two groups: a malformed input line
//! ([`JobError::SkippableRecord`]) is recovered by the chunk executor, every
//! other variant is fatal to the step that raised it.

use thiserror::Error;

use crate::model::SkipRecord;

/// Result type alias for job operations
pub type Result<T> = std::result::Result<T, JobError>;

/// Error type for job launch, step execution and record handling
#[derive(Error, Debug)]
pub enum JobError {
    /// Job parameters are missing or have the wrong type
    #[error("Invalid job parameters: {0}")]
    ParameterValidation(String),

    /// One input line could not be parsed into a billing record
    #[error("Malformed record at line {line_number}: {reason}")]
    SkippableRecord {
        line_number: usize,
        raw_line: String,
        reason: String,
    },

    /// More lines were skipped than the configured limit allows
    #[error("Skip limit of {limit} exceeded")]
    SkipLimitExceeded { limit: usize },

    /// A skip sink append or a chunk write could not be completed
    #[error("Sink write failed: {0}")]
    SinkWrite(String),

    /// Any other failure inside a tasklet or item processor
    #[error("Step execution failed: {0}")]
    StepExecution(String),

    /// Staging store failure
    #[error("Staging store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] billing_common::BillingError),
}

impl JobError {
    /// Create a parameter validation error
    pub fn parameter(msg: impl Into<String>) -> Self {
        Self::ParameterValidation(msg.into())
    }

    /// Create a sink write error
    pub fn sink_write(msg: impl Into<String>) -> Self {
        Self::SinkWrite(msg.into())
    }

    /// Create a step execution error
    pub fn step(msg: impl Into<String>) -> Self {
        Self::StepExecution(msg.into())
    }

    /// Create a staging store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a skippable record error for one input line
    pub fn skippable(line_number: usize, raw_line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SkippableRecord {
            line_number,
            raw_line: raw_line.into(),
            reason: reason.into(),
        }
    }

    /// The skip log entry for this error, if the skip policy may recover it
    pub fn skip_record(&self) -> Option<SkipRecord> {
        match self {
            Self::SkippableRecord {
                line_number,
                raw_line,
                ..
            } => Some(SkipRecord {
                line_number: *line_number,
                raw_line: raw_line.clone(),
            }),
            _ => None,
        }
    }

    /// Reclassify a write-stage failure as a sink write error
    pub(crate) fn into_sink_write(self) -> Self {
        match self {
            Self::SinkWrite(_) => self,
            other => Self::SinkWrite(other.to_string()),
        }
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for JobError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.to_string())
    }
}

#[cfg(feature = "database")]
impl From<sqlx::migrate::MigrateError> for JobError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Store(err.to_string())
    }
}

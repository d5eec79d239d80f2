//! Billing job parameter names and validation

use std::path::{Path, PathBuf};

use crate::error::{JobError, Result};
use crate::framework::{JobParameter, JobParameters, JobParametersValidator};
use crate::model::BillingPeriod;

pub const INPUT_FILE: &str = "input.file";
pub const OUTPUT_FILE: &str = "output.file";
pub const DATA_YEAR: &str = "data.year";
pub const DATA_MONTH: &str = "data.month";
pub const SKIP_FILE: &str = "skip.file";

/// Billing period named by `data.year` and `data.month`, if both are set
pub fn billing_period(params: &JobParameters) -> Option<BillingPeriod> {
    let year = i32::try_from(params.get_integer(DATA_YEAR)?).ok()?;
    let month = i32::try_from(params.get_integer(DATA_MONTH)?).ok()?;
    Some(BillingPeriod::new(year, month))
}

/// Skip log location for a run
///
/// An explicit `skip.file` wins. Otherwise the log lives in the staging
/// directory and is named after the billing period.
pub fn skip_file_path(staging_dir: &Path, params: &JobParameters) -> PathBuf {
    if let Some(path) = params.get_string(SKIP_FILE).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    match billing_period(params) {
        Some(period) => staging_dir.join(format!(
            "billing-data-skips-{}-{}.psv",
            period.year, period.month
        )),
        None => staging_dir.join("billing-data-skips.psv"),
    }
}

/// Report location for a run
///
/// An explicit `output.file` wins; otherwise the report is written next to
/// the staged input, named after the billing period.
pub fn report_file_path(staging_dir: &Path, params: &JobParameters) -> PathBuf {
    if let Some(path) = params.get_string(OUTPUT_FILE).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    match billing_period(params) {
        Some(period) => staging_dir.join(format!(
            "billing-report-{}-{}.csv",
            period.year, period.month
        )),
        None => staging_dir.join("billing-report.csv"),
    }
}

/// Rejects runs without an input file or with mistyped period parameters
#[derive(Debug, Default, Clone, Copy)]
pub struct BillingJobParametersValidator;

impl BillingJobParametersValidator {
    fn check_period_field(params: &JobParameters, key: &str) -> Result<()> {
        match params.get(key) {
            None => Ok(()),
            Some(JobParameter::Integer(v)) if i32::try_from(*v).is_ok() => Ok(()),
            Some(JobParameter::Integer(v)) => {
                Err(JobError::parameter(format!("{} is out of range: {}", key, v)))
            },
            Some(JobParameter::String(v)) => Err(JobError::parameter(format!(
                "{} must be an integer, got '{}'",
                key, v
            ))),
        }
    }
}

impl JobParametersValidator for BillingJobParametersValidator {
    fn validate(&self, params: &JobParameters) -> Result<()> {
        if params.is_empty() {
            return Err(JobError::parameter("job parameters are empty"));
        }

        match params.get(INPUT_FILE) {
            Some(JobParameter::String(v)) if !v.trim().is_empty() => {},
            Some(JobParameter::String(_)) => {
                return Err(JobError::parameter(format!("{} is empty", INPUT_FILE)))
            },
            Some(JobParameter::Integer(_)) => {
                return Err(JobError::parameter(format!("{} must be a string", INPUT_FILE)))
            },
            None => return Err(JobError::parameter(format!("{} is required", INPUT_FILE))),
        }

        Self::check_period_field(params, DATA_YEAR)?;
        Self::check_period_field(params, DATA_MONTH)?;
        Ok(())
    }
}

//! Delimited line codec for billing files and reports
//!
//! Column order for input lines and staged records:
//!
//! ```text
//! year,month,account_id,phone_number,data_usage,call_duration,sms_count
//! ```
//!
//! Report lines append the billing total as an eighth column.

use std::str::FromStr;

use crate::error::{JobError, Result};
use crate::model::{BillingRecord, ReportingRecord};

/// Field delimiter shared by input files and reports
pub const DELIMITER: char = ',';

/// Input columns, in file order
pub const BILLING_FIELDS: [&str; 7] = [
    "data_year",
    "data_month",
    "account_id",
    "phone_number",
    "data_usage",
    "call_duration",
    "sms_count",
];

/// Parse one input line into a billing record
///
/// Any failure is a [`JobError::SkippableRecord`] carrying the line number and
/// the raw content, so the caller can log the line and keep reading.
///
/// Numbers are re-rendered by [`format_record`] in their shortest form, so
/// only lines written that way come back byte for byte: `1.50` and `01`
/// parse fine but format as `1.5` and `1`.
pub fn parse(line: &str, line_number: usize) -> Result<BillingRecord> {
    let fields: Vec<&str> = line.split(DELIMITER).collect();
    if fields.len() != BILLING_FIELDS.len() {
        return Err(JobError::skippable(
            line_number,
            line,
            format!(
                "expected {} fields, found {}",
                BILLING_FIELDS.len(),
                fields.len()
            ),
        ));
    }

    let row = LineFields {
        fields: &fields,
        line,
        line_number,
    };

    let data_usage: f32 = row.numeric(4)?;
    if !data_usage.is_finite() {
        return Err(JobError::skippable(
            line_number,
            line,
            "data_usage must be a finite number",
        ));
    }

    Ok(BillingRecord {
        data_year: row.numeric(0)?,
        data_month: row.numeric(1)?,
        account_id: row.numeric(2)?,
        phone_number: fields[3].to_string(),
        data_usage,
        call_duration: row.numeric(5)?,
        sms_count: row.numeric(6)?,
    })
}

struct LineFields<'a> {
    fields: &'a [&'a str],
    line: &'a str,
    line_number: usize,
}

impl LineFields<'_> {
    fn numeric<T: FromStr>(&self, index: usize) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        let raw = self.fields[index];
        raw.parse::<T>().map_err(|e| {
            JobError::skippable(
                self.line_number,
                self.line,
                format!("invalid {} '{}': {}", BILLING_FIELDS[index], raw, e),
            )
        })
    }
}

/// Serialize a billing record with the input column order
pub fn format_record(record: &BillingRecord) -> String {
    format!(
        "{y}{d}{m}{d}{a}{d}{p}{d}{u}{d}{c}{d}{s}",
        y = record.data_year,
        m = record.data_month,
        a = record.account_id,
        p = record.phone_number,
        u = record.data_usage,
        c = record.call_duration,
        s = record.sms_count,
        d = DELIMITER,
    )
}

/// Serialize a report row: the billing columns followed by the total
pub fn format_report(record: &ReportingRecord) -> String {
    format!(
        "{}{}{:.2}",
        format_record(&record.billing),
        DELIMITER,
        record.billing_total
    )
}

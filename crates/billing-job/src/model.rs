//! Billing domain values

use serde::{Deserialize, Serialize};

/// One line of the monthly billing file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRecord {
    pub data_year: i32,
    pub data_month: i32,
    pub account_id: i64,
    pub phone_number: String,
    /// Data usage in MB
    pub data_usage: f32,
    /// Call duration in minutes
    pub call_duration: i32,
    pub sms_count: i32,
}

impl BillingRecord {
    pub fn period(&self) -> BillingPeriod {
        BillingPeriod::new(self.data_year, self.data_month)
    }
}

/// A billing record with its computed total, written to the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingRecord {
    pub billing: BillingRecord,
    pub billing_total: f64,
}

/// Year and month a job run is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: i32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: i32) -> Self {
        Self { year, month }
    }
}

impl std::fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// An input line the codec rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRecord {
    /// 1-based line number in the input file
    pub line_number: usize,
    pub raw_line: String,
}

impl SkipRecord {
    /// Skip log line, `<line-number>|<raw-line>`
    pub fn to_log_line(&self) -> String {
        format!("{}|{}", self.line_number, self.raw_line)
    }
}

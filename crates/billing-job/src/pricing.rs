//! Billing total calculation and spending threshold filter

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::framework::ItemProcessor;
use crate::model::{BillingRecord, ReportingRecord};

/// Per-unit pricing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingRates {
    /// Price per MB of data
    pub data: f64,
    /// Price per minute of call
    pub call: f64,
    /// Price per SMS
    pub sms: f64,
}

/// Computes billing totals and drops records below the spending threshold
#[derive(Debug, Clone, Copy)]
pub struct PricingCalculator {
    rates: PricingRates,
    threshold: f64,
}

impl PricingCalculator {
    pub fn new(rates: PricingRates, threshold: f64) -> Self {
        Self { rates, threshold }
    }

    pub fn rates(&self) -> PricingRates {
        self.rates
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Billing total for one record
    pub fn billing_total(&self, record: &BillingRecord) -> f64 {
        f64::from(record.data_usage) * self.rates.data
            + f64::from(record.call_duration) * self.rates.call
            + f64::from(record.sms_count) * self.rates.sms
    }

    /// Price a record; `None` when its total is below the threshold
    pub fn compute(&self, record: &BillingRecord) -> Option<ReportingRecord> {
        let billing_total = self.billing_total(record);
        if billing_total < self.threshold {
            return None;
        }
        Some(ReportingRecord {
            billing: record.clone(),
            billing_total,
        })
    }
}

/// Report-step processor backed by a [`PricingCalculator`]
pub struct BillingProcessor {
    calculator: PricingCalculator,
}

impl BillingProcessor {
    pub fn new(calculator: PricingCalculator) -> Self {
        Self { calculator }
    }
}

impl ItemProcessor<BillingRecord> for BillingProcessor {
    type Output = ReportingRecord;

    fn process(&mut self, item: BillingRecord) -> Result<Option<ReportingRecord>> {
        Ok(self.calculator.compute(&item))
    }
}

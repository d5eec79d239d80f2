//! Typed job parameters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single job parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobParameter {
    Integer(i64),
    String(String),
}

impl std::fmt::Display for JobParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobParameter::Integer(v) => write!(f, "{}", v),
            JobParameter::String(v) => f.write_str(v),
        }
    }
}

/// Immutable name -> value mapping supplied once per job run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParameters {
    #[serde(flatten)]
    values: BTreeMap<String, JobParameter>,
}

impl JobParameters {
    pub fn builder() -> JobParametersBuilder {
        JobParametersBuilder::default()
    }

    pub fn get(&self, key: &str) -> Option<&JobParameter> {
        self.values.get(key)
    }

    /// String value for `key`; `None` if absent or not a string
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(JobParameter::String(v)) => Some(v),
            _ => None,
        }
    }

    /// Integer value for `key`; `None` if absent or not an integer
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(JobParameter::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JobParameter)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Builder for JobParameters
#[derive(Default)]
pub struct JobParametersBuilder {
    values: BTreeMap<String, JobParameter>,
}

impl JobParametersBuilder {
    pub fn string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .insert(key.into(), JobParameter::String(value.into()));
        self
    }

    pub fn integer(mut self, key: impl Into<String>, value: i64) -> Self {
        self.values.insert(key.into(), JobParameter::Integer(value));
        self
    }

    /// Add a string parameter only when a value is present
    pub fn optional_string(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.string(key, v),
            None => self,
        }
    }

    /// Add an integer parameter only when a value is present
    pub fn optional_integer(self, key: impl Into<String>, value: Option<i64>) -> Self {
        match value {
            Some(v) => self.integer(key, v),
            None => self,
        }
    }

    pub fn build(self) -> JobParameters {
        JobParameters {
            values: self.values,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let params = JobParameters::builder()
            .string("input.file", "input/billing-2023-01.csv")
            .integer("data.year", 2023)
            .optional_integer("data.month", Some(1))
            .optional_string("output.file", None::<String>)
            .build();

        assert_eq!(params.get_string("input.file"), Some("input/billing-2023-01.csv"));
        assert_eq!(params.get_integer("data.year"), Some(2023));
        assert_eq!(params.get_integer("data.month"), Some(1));
        assert!(!params.contains("output.file"));

        // Wrong type reads as absent
        assert_eq!(params.get_integer("input.file"), None);
        assert_eq!(params.get_string("data.year"), None);
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let params = JobParameters::builder()
            .string("input.file", "in.csv")
            .integer("data.year", 2023)
            .build();
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({"data.year": 2023, "input.file": "in.csv"}));
    }
}

//! Telemetry — metric points sent by a thing and the entries the server keeps.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{LabError, ValidationError};
use crate::id::TelemetryId;
use crate::time::{format_wire, parse_wire};

/// A set of named numeric readings, serialized as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryPoint(BTreeMap<String, f64>);

impl TelemetryPoint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) one metric.
    #[must_use]
    pub fn metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// A telemetry point as stored and returned by the server.
///
/// Only `id` and `ts` have a known meaning; everything else the server sends
/// (metric values, owning thing, …) is kept verbatim in `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TelemetryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    #[serde(flatten)]
    pub values: serde_json::Map<String, serde_json::Value>,
}

impl TelemetryEntry {
    /// Numeric value of a metric, if present.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(serde_json::Value::as_f64)
    }
}

/// Inclusive time window for telemetry queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    /// Build a range from two timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedRange`] when `start` is after `end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, LabError> {
        if start > end {
            return Err(ValidationError::InvertedRange {
                start: format_wire(start),
                end: format_wire(end),
            }
            .into());
        }
        Ok(Self { start, end })
    }

    /// Build a range from two `YYYY-MM-DD HH:mm:ss` strings.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Validation`] when either timestamp is malformed or
    /// the range is inverted.
    pub fn parse(start: &str, end: &str) -> Result<Self, LabError> {
        Self::new(parse_wire(start)?, parse_wire(end)?)
    }

    #[must_use]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// `startTs` / `endTs` query parameters.
    #[must_use]
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("startTs", format_wire(self.start)),
            ("endTs", format_wire(self.end)),
        ]
    }
}

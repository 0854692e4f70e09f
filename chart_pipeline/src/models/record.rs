//! Normalized per-bar display records.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::pipeline::windowing::Window;

/// A required field that was missing or not numeric.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[error("field `{field}` is missing or malformed (raw: {raw:?})")]
pub struct MalformedField {
    pub field: String,
    /// The raw value as received, `None` when the field was absent.
    pub raw: Option<String>,
}

impl MalformedField {
    pub fn new(field: &str, raw: Option<&Value>) -> Self {
        let raw = raw.map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        Self {
            field: field.to_string(),
            raw,
        }
    }
}

/// Open/high/low/close of one interval.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Price part of a record: parsed, or marked unusable for charting.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Candle {
    Valid(Ohlc),
    Malformed(MalformedField),
}

/// Candle colouring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// One timestamp of the chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayRecord {
    /// `None` when the bar's datetime could not be parsed.
    pub date: Option<DateTime<Utc>>,
    pub candle: Candle,
    /// Derived indicator values keyed by display field. Every bound field has
    /// an entry; `None` means "no value at this bar", which is distinct from 0.
    #[serde(flatten)]
    pub derived: IndexMap<String, Option<f64>>,
}

impl DisplayRecord {
    pub fn ohlc(&self) -> Option<&Ohlc> {
        match &self.candle {
            Candle::Valid(ohlc) => Some(ohlc),
            Candle::Malformed(_) => None,
        }
    }

    pub fn is_chartable(&self) -> bool {
        self.date.is_some() && self.ohlc().is_some()
    }

    /// Value of a derived field; `None` if absent or not bound at all.
    pub fn get(&self, field: &str) -> Option<f64> {
        self.derived.get(field).copied().flatten()
    }

    /// `Up` when the close is above the open.
    pub fn direction(&self) -> Option<Direction> {
        self.ohlc().map(|o| {
            if o.close > o.open {
                Direction::Up
            } else {
                Direction::Down
            }
        })
    }
}

/// The full, ordered output of one normalization pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordSeries {
    records: Vec<DisplayRecord>,
}

impl RecordSeries {
    pub fn new(records: Vec<DisplayRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DisplayRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DisplayRecord> {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DisplayRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&DisplayRecord> {
        self.records.get(index)
    }

    /// True if at least one record carries a value for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.records.iter().any(|r| r.get(field).is_some())
    }

    /// Close of the most recent valid record.
    pub fn last_close(&self) -> Option<f64> {
        self.records.iter().rev().find_map(|r| r.ohlc()).map(|o| o.close)
    }

    /// `(lowest low, highest high)` over the valid records of `window`.
    pub fn price_extent(&self, window: Window) -> Option<(f64, f64)> {
        let end = window.end.min(self.records.len().checked_sub(1)?);
        self.records
            .get(window.start..=end)?
            .iter()
            .filter_map(DisplayRecord::ohlc)
            .fold(None, |acc, o| match acc {
                None => Some((o.low, o.high)),
                Some((lo, hi)) => Some((f64::min(lo, o.low), f64::max(hi, o.high))),
            })
    }
}

impl From<Vec<DisplayRecord>> for RecordSeries {
    fn from(records: Vec<DisplayRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a RecordSeries {
    type Item = &'a DisplayRecord;
    type IntoIter = std::slice::Iter<'a, DisplayRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

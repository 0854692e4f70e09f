//! Wire shape of a batch response, decoded defensively.
//!
//! The API answers `{"data": [{"values": [...]}, ...]}` with one entry per
//! requested method, in request order. Anything else (an error object, a
//! still-loading placeholder, a `values` that is not an array) must not take
//! the chart down, so the decode step maps unexpected shapes to variants the
//! normalizer treats as "absent" instead of failing.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::record::MalformedField;

/// Decoded batch response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub data: Option<Vec<SeriesEntry>>,
    /// `"ok"` / `"error"` when the API reports it.
    #[serde(default)]
    pub status: Option<String>,
    /// Error message accompanying `status = "error"`.
    #[serde(default)]
    pub message: Option<String>,
}

impl BatchResponse {
    /// Decode a response body. Bodies that are not a JSON object of the
    /// expected shape decode to an empty response.
    pub fn from_slice(body: &[u8]) -> Self {
        match serde_json::from_slice(body) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, bytes = body.len(), "undecodable batch response, treating as empty");
                Self::default()
            }
        }
    }

    pub fn entries(&self) -> &[SeriesEntry] {
        self.data.as_deref().unwrap_or_default()
    }

    /// The result points at position `index`, if that entry carries any.
    pub fn values(&self, index: usize) -> Option<&[RawPoint]> {
        self.entries().get(index).and_then(SeriesEntry::values)
    }

    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }
}

/// One element of `data`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum SeriesEntry {
    Values { values: Vec<RawPoint> },
    /// Any other shape (per-method error object, placeholder, ...).
    Unrecognized(Value),
}

impl SeriesEntry {
    pub fn values(&self) -> Option<&[RawPoint]> {
        match self {
            SeriesEntry::Values { values } => Some(values),
            SeriesEntry::Unrecognized(_) => None,
        }
    }
}

/// One result point: a bar (`datetime`, `open`, `high`, `low`, `close`) or an
/// indicator sample whose keys depend on the indicator.
///
/// Non-object elements decode to an empty point so they still occupy their
/// position in the array.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct RawPoint(pub Map<String, Value>);

/// A raw OHLC bar.
pub type RawBar = RawPoint;
/// A raw indicator sample.
pub type RawIndicatorPoint = RawPoint;

impl From<Value> for RawPoint {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RawPoint(map),
            _ => RawPoint::default(),
        }
    }
}

impl RawPoint {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn datetime(&self) -> Option<&str> {
        self.get("datetime").and_then(Value::as_str)
    }

    /// Read `key` as a finite number. Numeric strings and JSON numbers are
    /// both accepted.
    pub fn number(&self, key: &str) -> Result<f64, MalformedField> {
        let value = self.get(key);
        let parsed = match value {
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(Value::Number(n)) => n.as_f64(),
            _ => None,
        };
        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| MalformedField::new(key, value))
    }
}

//! Positional merge of a batch response into display records.
//!
//! `data[0]` holds the bars and anchors the output: one record per bar, in the
//! order received. Every other entry is read through the [`FieldBinding`]s
//! derived from the request, by position: value *i* of `data[k]` belongs to
//! bar *i*. Indicator series are often shorter than the bar series (warm-up
//! window), absent, or malformed; all of that only leaves fields empty.

use chrono_tz::Tz;
use indexmap::IndexMap;

use crate::{
    models::{
        record::{Candle, DisplayRecord, MalformedField, Ohlc, RecordSeries},
        response::{BatchResponse, RawBar, RawPoint},
        series_request::{SeriesRequest, SortOrder},
    },
    pipeline::{binding::FieldBinding, timestamp::parse_bar_datetime},
};

/// Result of one normalization pass.
#[derive(Clone, Debug, PartialEq)]
pub enum Normalized {
    /// No usable bar series yet; render the loading state.
    Empty,
    Ready(RecordSeries),
}

impl Normalized {
    pub fn records(&self) -> Option<&RecordSeries> {
        match self {
            Normalized::Empty => None,
            Normalized::Ready(series) => Some(series),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Normalized::Empty)
    }
}

/// Merge `response` into records using `bindings`; bar datetimes are read in `tz`.
pub fn normalize(response: &BatchResponse, bindings: &[FieldBinding], tz: Tz) -> Normalized {
    let bars = match response.values(0) {
        Some(bars) if !bars.is_empty() => bars,
        _ => {
            tracing::debug!(
                entries = response.entries().len(),
                status = response.status.as_deref().unwrap_or("-"),
                "no bars in response"
            );
            return Normalized::Empty;
        }
    };

    let series: Vec<(&FieldBinding, &[RawPoint])> = bindings
        .iter()
        .map(|binding| {
            let values = response.values(binding.response_index).unwrap_or_default();
            if values.len() < bars.len() {
                tracing::debug!(
                    field = %binding.field,
                    index = binding.response_index,
                    have = values.len(),
                    bars = bars.len(),
                    "indicator series shorter than bars"
                );
            }
            (binding, values)
        })
        .collect();

    let records: Vec<DisplayRecord> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let (date, candle) = parse_bar(bar, tz);
            let mut derived: IndexMap<String, Option<f64>> = IndexMap::with_capacity(series.len());
            for (binding, values) in &series {
                let value = values
                    .get(i)
                    .and_then(|point| binding.parser.apply(point, &binding.source));
                let slot = derived.entry(binding.field.clone()).or_insert(None);
                if value.is_some() {
                    *slot = value;
                }
            }
            DisplayRecord {
                date,
                candle,
                derived,
            }
        })
        .collect();

    let malformed = records.iter().filter(|r| !r.is_chartable()).count();
    if malformed > 0 {
        tracing::debug!(malformed, total = records.len(), "records with unusable price data");
    }

    Normalized::Ready(RecordSeries::new(records))
}

/// [`normalize`] with the bindings and timezone of the originating request.
///
/// Records always come out oldest first. A `DESC` response is merged in the
/// order received (positions still line up across entries) and the merged
/// records are then reversed as a whole.
pub fn normalize_for(response: &BatchResponse, request: &SeriesRequest) -> Normalized {
    let received = response.entries().len();
    if received < request.expected_entries() {
        tracing::debug!(
            received,
            expected = request.expected_entries(),
            "response has fewer entries than requested methods"
        );
    }

    match normalize(response, &request.bindings(), request.timezone) {
        Normalized::Ready(series) if request.order == SortOrder::Desc => {
            let mut records = series.into_records();
            records.reverse();
            Normalized::Ready(RecordSeries::new(records))
        }
        normalized => normalized,
    }
}

/// Decode a raw response body and normalize it for `request`.
pub fn normalize_bytes(body: &[u8], request: &SeriesRequest) -> Normalized {
    normalize_for(&BatchResponse::from_slice(body), request)
}

fn parse_bar(bar: &RawBar, tz: Tz) -> (Option<chrono::DateTime<chrono::Utc>>, Candle) {
    let date = bar.datetime().and_then(|raw| parse_bar_datetime(raw, tz));
    if date.is_none() {
        let candle = Candle::Malformed(MalformedField::new("datetime", bar.get("datetime")));
        return (None, candle);
    }
    let candle = match parse_ohlc(bar) {
        Ok(ohlc) => Candle::Valid(ohlc),
        Err(field) => Candle::Malformed(field),
    };
    (date, candle)
}

fn parse_ohlc(bar: &RawBar) -> Result<Ohlc, MalformedField> {
    Ok(Ohlc {
        open: bar.number("open")?,
        high: bar.number("high")?,
        low: bar.number("low")?,
        close: bar.number("close")?,
    })
}

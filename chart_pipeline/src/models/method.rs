//! Methods of a batch request: the bar series itself and indicator jobs.
//!
//! The position of a [`MethodSpec`] inside
//! [`SeriesRequest::methods`](crate::models::series_request::SeriesRequest::methods)
//! is the position of its result array in the response. Each
//! [`IndicatorJob`] also declares which raw keys of its result points become
//! which display fields ([`IndicatorOutput`]); that declaration is what the
//! normalizer is driven by, so new indicators need no pipeline changes.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Number;

use crate::models::response::RawPoint;

/// Wire name of the bar-series method.
pub const TIME_SERIES: &str = "time_series";

/// Display field names produced by the built-in indicator jobs.
pub mod fields {
    pub const ATR: &str = "atr";
    pub const ICHIMOKU: &str = "ichimoku";
    pub const TREND_UP: &str = "trendUp";
    pub const TREND_DOWN: &str = "trendDown";
}

/// One entry of a batch request.
#[derive(Clone, Debug)]
pub enum MethodSpec {
    /// OHLC bars; always at index 0.
    TimeSeries,
    Indicator(IndicatorJob),
}

impl Serialize for MethodSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MethodSpec::TimeSeries => serializer.serialize_str(TIME_SERIES),
            MethodSpec::Indicator(job) => job.serialize(serializer),
        }
    }
}

/// How a raw indicator value turns into a display value.
///
/// The raw value is always read as a number first (numeric string or JSON
/// number); a value that does not parse never reaches the parser.
#[derive(Clone, Copy, Debug)]
pub enum ValueParser {
    /// Use the number as is.
    Number,
    /// `max(v, 0)`: the upward part of a signed histogram.
    PositivePart,
    /// `max(-v, 0)`: the magnitude of the downward part of a signed histogram.
    NegativeMagnitude,
    /// Caller-supplied transform; `None` leaves the field absent.
    Map(fn(f64) -> Option<f64>),
}

impl ValueParser {
    pub fn apply(self, point: &RawPoint, key: &str) -> Option<f64> {
        let value = point.number(key).ok()?;
        match self {
            ValueParser::Number => Some(value),
            ValueParser::PositivePart => Some(value.max(0.0)),
            ValueParser::NegativeMagnitude => Some((-value).max(0.0)),
            ValueParser::Map(f) => f(value).filter(|v| v.is_finite()),
        }
    }
}

/// Binds one raw key of an indicator's result points to a display field.
#[derive(Clone, Debug)]
pub struct IndicatorOutput {
    /// Field name on the display record.
    pub field: String,
    /// Key inside each raw result point.
    pub source: String,
    pub parser: ValueParser,
}

impl IndicatorOutput {
    pub fn new(field: impl Into<String>, source: impl Into<String>, parser: ValueParser) -> Self {
        Self {
            field: field.into(),
            source: source.into(),
            parser,
        }
    }
}

/// A named indicator computed by the API alongside the bars.
///
/// Serializes as `{"name": ..., "symbol": ..., "interval": ..., <params>}`.
/// `symbol` and `interval` may be left unset; the request builder fills them in
/// from the chart query.
#[derive(Clone, Debug, Serialize)]
pub struct IndicatorJob {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(flatten)]
    pub params: IndexMap<String, Number>,
    #[serde(skip)]
    pub outputs: Vec<IndicatorOutput>,
}

impl IndicatorJob {
    /// An indicator with no parameters and no outputs yet.
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: None,
            interval: None,
            params: IndexMap::new(),
            outputs: Vec::new(),
        }
    }

    /// Average True Range over `time_period` bars.
    pub fn atr(time_period: u32) -> Self {
        Self::custom("atr")
            .param("time_period", time_period)
            .output(fields::ATR, "atr", ValueParser::Number)
    }

    /// Ichimoku cloud; only the leading span A line is charted.
    pub fn ichimoku(
        conversion_line_period: u32,
        base_line_period: u32,
        leading_span_b_period: u32,
        lagging_span_period: u32,
    ) -> Self {
        Self::custom("ichimoku")
            .param("conversion_line_period", conversion_line_period)
            .param("base_line_period", base_line_period)
            .param("leading_span_b_period", leading_span_b_period)
            .param("lagging_span_period", lagging_span_period)
            .output(fields::ICHIMOKU, "senkou_span_a", ValueParser::Number)
    }

    /// MACD histogram split into up/down trend bars.
    pub fn macd(fast_period: u32, slow_period: u32, signal_period: u32) -> Self {
        Self::custom("macd")
            .param("fast_period", fast_period)
            .param("slow_period", slow_period)
            .param("signal_period", signal_period)
            .output(fields::TREND_UP, "macd_hist", ValueParser::PositivePart)
            .output(fields::TREND_DOWN, "macd_hist", ValueParser::NegativeMagnitude)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Number>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn output(mut self, field: impl Into<String>, source: impl Into<String>, parser: ValueParser) -> Self {
        self.outputs.push(IndicatorOutput::new(field, source, parser));
        self
    }

    pub fn for_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn on_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = Some(interval.into());
        self
    }
}

impl Default for IndicatorJob {
    /// ATR(14), the overlay the chart shows when nothing else is asked for.
    fn default() -> Self {
        Self::atr(14)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn time_series_serializes_as_bare_name() {
        assert_eq!(serde_json::to_value(MethodSpec::TimeSeries).unwrap(), json!("time_series"));
    }

    #[test]
    fn indicator_serializes_name_target_and_params_but_not_outputs() {
        let job = IndicatorJob::macd(12, 26, 9).for_symbol("EUR/USD").on_interval("1h");
        assert_eq!(
            serde_json::to_value(MethodSpec::Indicator(job)).unwrap(),
            json!({
                "name": "macd",
                "symbol": "EUR/USD",
                "interval": "1h",
                "fast_period": 12,
                "slow_period": 26,
                "signal_period": 9
            })
        );
    }

    #[test]
    fn unset_target_is_omitted() {
        let value = serde_json::to_value(IndicatorJob::atr(14)).unwrap();
        assert_eq!(value, json!({ "name": "atr", "time_period": 14 }));
    }

    #[test]
    fn histogram_parsers_split_sign() {
        let up: RawPoint = serde_json::from_value(json!({ "macd_hist": "0.5" })).unwrap();
        let down: RawPoint = serde_json::from_value(json!({ "macd_hist": "-0.25" })).unwrap();

        assert_eq!(ValueParser::PositivePart.apply(&up, "macd_hist"), Some(0.5));
        assert_eq!(ValueParser::NegativeMagnitude.apply(&up, "macd_hist"), Some(0.0));
        assert_eq!(ValueParser::PositivePart.apply(&down, "macd_hist"), Some(0.0));
        assert_eq!(ValueParser::NegativeMagnitude.apply(&down, "macd_hist"), Some(0.25));
    }

    #[test]
    fn unparsable_value_is_absent_not_zero() {
        let point: RawPoint = serde_json::from_value(json!({ "atr": "n/a" })).unwrap();
        assert_eq!(ValueParser::Number.apply(&point, "atr"), None);
        assert_eq!(ValueParser::Number.apply(&point, "missing"), None);
    }

    #[test]
    fn custom_map_parser() {
        let point: RawPoint = serde_json::from_value(json!({ "rsi": 72.0 })).unwrap();
        let overbought = ValueParser::Map(|v| (v > 70.0).then_some(v));
        assert_eq!(overbought.apply(&point, "rsi"), Some(72.0));
    }
}

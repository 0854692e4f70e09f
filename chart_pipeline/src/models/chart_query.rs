//! The parameters identifying one chart: instrument pair and sampling interval.

use crate::query_codec::{self, QueryMap, QueryValue};

/// Query-string key carrying the instrument pair.
pub const PAIR_KEY: &str = "pair";
/// Query-string key carrying the sampling interval.
pub const INTERVAL_KEY: &str = "time";

pub const DEFAULT_PAIR: &str = "EUR/USD";
pub const DEFAULT_INTERVAL: &str = "30min";

/// Which instrument to chart, and at what interval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartQuery {
    /// Instrument identifier (e.g. `"EUR/USD"`).
    pub pair: String,
    /// Sampling interval as the API spells it (e.g. `"30min"`, `"1day"`).
    pub interval: String,
}

impl ChartQuery {
    pub fn new(pair: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            pair: pair.into(),
            interval: interval.into(),
        }
    }

    /// Build a query from a URL query string such as `?pair=EUR/USD&time=30min`.
    ///
    /// Missing or blank keys fall back to [`DEFAULT_PAIR`] / [`DEFAULT_INTERVAL`].
    pub fn from_query_string(query: &str) -> Self {
        Self::from_params(&query_codec::decode(query))
    }

    pub fn from_params(params: &QueryMap) -> Self {
        let pick = |key: &str, default: &str| {
            params
                .get(key)
                .and_then(QueryValue::first)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        Self {
            pair: pick(PAIR_KEY, DEFAULT_PAIR),
            interval: pick(INTERVAL_KEY, DEFAULT_INTERVAL),
        }
    }

    pub fn to_params(&self) -> QueryMap {
        let mut params = QueryMap::new();
        params.insert(PAIR_KEY.to_string(), self.pair.as_str().into());
        params.insert(INTERVAL_KEY.to_string(), self.interval.as_str().into());
        params
    }

    /// Encode as a query string, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        query_codec::encode(&self.to_params())
    }
}

impl Default for ChartQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAIR, DEFAULT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_route_query() {
        let q = ChartQuery::from_query_string("?pair=EUR/USD&time=30min");
        assert_eq!(q, ChartQuery::new("EUR/USD", "30min"));
    }

    #[test]
    fn missing_keys_use_defaults() {
        assert_eq!(ChartQuery::from_query_string(""), ChartQuery::default());

        let q = ChartQuery::from_query_string("pair=GBP%2FUSD");
        assert_eq!(q.pair, "GBP/USD");
        assert_eq!(q.interval, DEFAULT_INTERVAL);

        let q = ChartQuery::from_query_string("pair=&time=1h");
        assert_eq!(q.pair, DEFAULT_PAIR);
        assert_eq!(q.interval, "1h");
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        let q = ChartQuery::from_query_string("theme=dark&time=1day&pair=AAPL");
        assert_eq!(q, ChartQuery::new("AAPL", "1day"));
    }

    proptest! {
        #[test]
        fn query_string_round_trips(
            pair in "[A-Za-z0-9][A-Za-z0-9/_]{0,10}",
            interval in "[A-Za-z0-9_]{1,8}",
        ) {
            let q = ChartQuery::new(pair, interval);
            prop_assert_eq!(ChartQuery::from_query_string(&q.to_query_string()), q);
        }
    }
}

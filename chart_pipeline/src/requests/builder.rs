//! Assembles the single batched request issued per chart load.

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use shared_utils::config::RequestConfig;

use crate::{
    models::{
        chart_query::ChartQuery,
        method::{IndicatorJob, MethodSpec},
        series_request::{SeriesRequest, SortOrder},
    },
    requests::RequestError,
};

pub const DEFAULT_TIMEZONE: &str = "Europe/Rome";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// End of the requested date range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EndDate {
    /// Today in the request timezone, resolved once per build.
    #[default]
    Now,
    On(NaiveDate),
}

/// Builder for [`SeriesRequest`].
///
/// The bar series always goes first; indicator jobs follow in the order they
/// were added, which fixes where their results land in the response.
///
/// ```
/// use chart_pipeline::{ChartQuery, IndicatorJob, RequestBuilder};
///
/// let query = ChartQuery::new("EUR/USD", "30min");
/// let request = RequestBuilder::new(&query)
///     .indicator(IndicatorJob::atr(14))
///     .build()
///     .unwrap();
/// assert_eq!(request.methods.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    query: ChartQuery,
    start: Option<NaiveDate>,
    end: EndDate,
    lookback_days: u32,
    timezone: String,
    order: SortOrder,
    output_size: Option<u32>,
    indicators: Vec<IndicatorJob>,
}

impl RequestBuilder {
    pub fn new(query: &ChartQuery) -> Self {
        Self {
            query: query.clone(),
            start: None,
            end: EndDate::Now,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            timezone: DEFAULT_TIMEZONE.to_string(),
            order: SortOrder::Asc,
            output_size: None,
            indicators: Vec::new(),
        }
    }

    /// Start from the `[request]` table of the configuration.
    pub fn from_config(query: &ChartQuery, config: &RequestConfig) -> Result<Self, RequestError> {
        Ok(Self::new(query)
            .timezone(&config.timezone)
            .lookback_days(config.lookback_days)
            .order(config.order.parse()?)
            .output_size(config.output_size))
    }

    pub fn query(&self) -> &ChartQuery {
        &self.query
    }

    /// Fixed start date; otherwise the start is `lookback_days` before the end.
    pub fn start_date(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end_date(mut self, end: EndDate) -> Self {
        self.end = end;
        self
    }

    pub fn lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn output_size(mut self, output_size: Option<u32>) -> Self {
        self.output_size = output_size;
        self
    }

    pub fn indicator(mut self, job: IndicatorJob) -> Self {
        self.indicators.push(job);
        self
    }

    pub fn indicators(mut self, jobs: impl IntoIterator<Item = IndicatorJob>) -> Self {
        self.indicators.extend(jobs);
        self
    }

    /// Build against the current wall clock.
    pub fn build(&self) -> Result<SeriesRequest, RequestError> {
        self.build_at(Utc::now())
    }

    /// Build with `now` as the reference instant for [`EndDate::Now`].
    pub fn build_at(&self, now: DateTime<Utc>) -> Result<SeriesRequest, RequestError> {
        let timezone: Tz = self
            .timezone
            .trim()
            .parse()
            .map_err(|_| RequestError::InvalidTimezone(self.timezone.clone()))?;

        let end_date = match self.end {
            EndDate::Now => now.with_timezone(&timezone).date_naive(),
            EndDate::On(date) => date,
        };
        let start_date = match self.start {
            Some(date) => date,
            None => end_date
                .checked_sub_days(Days::new(u64::from(self.lookback_days)))
                .unwrap_or(NaiveDate::MIN),
        };
        if start_date > end_date {
            return Err(RequestError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        let methods: Vec<MethodSpec> = std::iter::once(MethodSpec::TimeSeries)
            .chain(self.indicators.iter().cloned().map(|mut job| {
                job.symbol.get_or_insert_with(|| self.query.pair.clone());
                job.interval.get_or_insert_with(|| self.query.interval.clone());
                MethodSpec::Indicator(job)
            }))
            .collect();

        tracing::debug!(
            pair = %self.query.pair,
            interval = %self.query.interval,
            %start_date,
            %end_date,
            methods = methods.len(),
            "built series request"
        );

        Ok(SeriesRequest {
            symbols: vec![self.query.pair.clone()],
            intervals: vec![self.query.interval.clone()],
            start_date,
            end_date,
            order: self.order,
            timezone,
            output_size: self.output_size,
            methods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn body_matches_the_batch_endpoint_shape() {
        let query = ChartQuery::new("GBP/USD", "30min");
        let request = RequestBuilder::new(&query)
            .indicator(IndicatorJob::atr(14))
            .build_at(at(2021, 3, 30, 12))
            .unwrap();

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "symbols": ["GBP/USD"],
                "intervals": ["30min"],
                "start_date": "2021-02-28",
                "end_date": "2021-03-30",
                "order": "ASC",
                "timezone": "Europe/Rome",
                "methods": [
                    "time_series",
                    { "name": "atr", "symbol": "GBP/USD", "interval": "30min", "time_period": 14 }
                ]
            })
        );
    }

    #[test]
    fn body_snapshot_keeps_field_order() {
        let request = RequestBuilder::new(&ChartQuery::new("GBP/USD", "30min"))
            .indicator(IndicatorJob::atr(14))
            .build_at(at(2021, 3, 30, 12))
            .unwrap();

        insta::assert_json_snapshot!(request, @r#"
        {
          "symbols": [
            "GBP/USD"
          ],
          "intervals": [
            "30min"
          ],
          "start_date": "2021-02-28",
          "end_date": "2021-03-30",
          "order": "ASC",
          "timezone": "Europe/Rome",
          "methods": [
            "time_series",
            {
              "name": "atr",
              "symbol": "GBP/USD",
              "interval": "30min",
              "time_period": 14
            }
          ]
        }
        "#);
    }

    #[test]
    fn time_series_is_always_first_and_indicators_keep_their_order() {
        let request = RequestBuilder::new(&ChartQuery::default())
            .indicator(IndicatorJob::macd(12, 26, 9))
            .indicator(IndicatorJob::atr(14))
            .indicator(IndicatorJob::ichimoku(9, 26, 52, 26))
            .build_at(at(2021, 3, 30, 12))
            .unwrap();

        let names: Vec<&str> = request
            .methods
            .iter()
            .map(|m| match m {
                MethodSpec::TimeSeries => "time_series",
                MethodSpec::Indicator(job) => job.name.as_str(),
            })
            .collect();
        assert_eq!(names, ["time_series", "macd", "atr", "ichimoku"]);
    }

    #[test]
    fn explicit_indicator_target_is_kept() {
        let request = RequestBuilder::new(&ChartQuery::new("EUR/USD", "30min"))
            .indicator(IndicatorJob::atr(14).on_interval("1h"))
            .build_at(at(2021, 3, 30, 12))
            .unwrap();
        let MethodSpec::Indicator(job) = &request.methods[1] else {
            panic!("expected an indicator at index 1");
        };
        assert_eq!(job.interval.as_deref(), Some("1h"));
        assert_eq!(job.symbol.as_deref(), Some("EUR/USD"));
    }

    #[test]
    fn now_resolves_in_request_timezone() {
        // 23:30 UTC on the 30th is already the 31st in Rome (UTC+2 in summer time).
        let now = Utc.with_ymd_and_hms(2021, 3, 30, 23, 30, 0).unwrap();
        let request = RequestBuilder::new(&ChartQuery::default()).build_at(now).unwrap();
        assert_eq!(request.end_date, date(2021, 3, 31));

        let request = RequestBuilder::new(&ChartQuery::default())
            .timezone("America/New_York")
            .build_at(now)
            .unwrap();
        assert_eq!(request.end_date, date(2021, 3, 30));
    }

    #[test]
    fn explicit_dates_and_output_size() {
        let request = RequestBuilder::new(&ChartQuery::default())
            .start_date(date(2021, 2, 1))
            .end_date(EndDate::On(date(2021, 2, 10)))
            .output_size(Some(500))
            .order(SortOrder::Desc)
            .build_at(at(2030, 1, 1, 0))
            .unwrap();
        assert_eq!(request.start_date, date(2021, 2, 1));
        assert_eq!(request.end_date, date(2021, 2, 10));

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["outputsize"], 500);
        assert_eq!(body["order"], "DESC");
    }

    #[test]
    fn rejects_unknown_timezone_and_inverted_range() {
        let err = RequestBuilder::new(&ChartQuery::default())
            .timezone("Mars/Olympus")
            .build_at(at(2021, 3, 30, 12))
            .unwrap_err();
        assert_eq!(err, RequestError::InvalidTimezone("Mars/Olympus".into()));

        let err = RequestBuilder::new(&ChartQuery::default())
            .start_date(date(2021, 4, 1))
            .end_date(EndDate::On(date(2021, 3, 1)))
            .build_at(at(2021, 3, 30, 12))
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidRange { .. }));
    }

    #[test]
    fn from_config_applies_request_table() {
        let config = RequestConfig {
            timezone: "UTC".into(),
            lookback_days: 7,
            order: "desc".into(),
            output_size: Some(100),
        };
        let request = RequestBuilder::from_config(&ChartQuery::default(), &config)
            .unwrap()
            .build_at(at(2021, 3, 30, 12))
            .unwrap();
        assert_eq!(request.start_date, date(2021, 3, 23));
        assert_eq!(request.order, SortOrder::Desc);
        assert_eq!(request.timezone, chrono_tz::UTC);
        assert_eq!(request.output_size, Some(100));
    }
}

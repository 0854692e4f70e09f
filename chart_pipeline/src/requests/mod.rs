pub mod builder;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while assembling a [`SeriesRequest`](crate::models::series_request::SeriesRequest).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// The timezone is not a known IANA zone name.
    #[error("unknown timezone: {0}")]
    InvalidTimezone(String),

    /// The start date lies after the end date.
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// The sort order is neither `ASC` nor `DESC`.
    #[error("invalid sort order: {0}")]
    InvalidOrder(String),
}

//! Data pipeline behind the candlestick chart view.
//!
//! A chart is identified by a [`ChartQuery`](models::chart_query::ChartQuery)
//! decoded from the URL. From it a single batched
//! [`SeriesRequest`](models::series_request::SeriesRequest) is built (bars plus
//! indicator jobs), sent through a [`SeriesProvider`](providers::SeriesProvider),
//! and the positional arrays of the response are merged into one ordered
//! [`RecordSeries`](models::record::RecordSeries). The windowing and pane
//! layout helpers then tell the presentation layer what to draw where.
//!
//! [`ChartSession`](session::ChartSession) ties these steps to the lifetime
//! of one mounted chart.

pub mod errors;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod query_codec;
pub mod requests;
pub mod session;

pub use errors::Error;
pub use models::{
    chart_query::ChartQuery,
    method::{IndicatorJob, MethodSpec},
    record::{Candle, DisplayRecord, RecordSeries},
    series_request::{SeriesRequest, SortOrder},
};
pub use pipeline::{
    layout::{IndicatorPane, PaneLayout, plan_panes},
    normalizer::{Normalized, normalize},
    windowing::{Window, default_window},
};
pub use requests::builder::{EndDate, RequestBuilder};
pub use session::{ChartSession, ChartState, ChartView};

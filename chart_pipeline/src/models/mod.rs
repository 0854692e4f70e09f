pub mod chart_query;
pub mod method;
pub mod record;
pub mod response;
pub mod series_request;

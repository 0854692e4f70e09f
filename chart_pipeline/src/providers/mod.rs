//! Provider abstraction for the batched time-series API.
//!
//! This module defines the [`SeriesProvider`] trait, the seam between the pipeline
//! and the network. [`complex_rest::ComplexDataProvider`] is the HTTP
//! implementation; tests and embedders can supply their own.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`Arc<dyn SeriesProvider>`), which is how [`ChartSession`](crate::session::ChartSession)
//! holds it.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use chart_pipeline::models::{response::BatchResponse, series_request::SeriesRequest};
//! use chart_pipeline::providers::{ProviderError, SeriesProvider};
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl SeriesProvider for Offline {
//!     async fn fetch_series(&self, _request: &SeriesRequest) -> Result<BatchResponse, ProviderError> {
//!         Ok(BatchResponse::default())
//!     }
//! }
//! ```

pub mod complex_rest;
pub mod errors;

use async_trait::async_trait;

pub use errors::{ProviderError, ProviderInitError};

use crate::models::{response::BatchResponse, series_request::SeriesRequest};

/// Fetches the results of one batched request.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Issues `request` and returns the decoded response.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchResponse)` - Whatever the API answered with a success status.
    ///   Unexpected shapes come back as an empty response, not as an error.
    /// * `Err(ProviderError)` - The call itself failed.
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<BatchResponse, ProviderError>;
}

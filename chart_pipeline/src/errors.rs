use thiserror::Error;

use crate::{
    pipeline::layout::LayoutError,
    providers::{ProviderError, ProviderInitError},
    requests::RequestError,
};

/// The unified error type for the `chart_pipeline` crate.
///
/// Empty responses and malformed fields are not errors: they come back as
/// [`Normalized::Empty`](crate::pipeline::normalizer::Normalized::Empty) and
/// [`Candle::Malformed`](crate::models::record::Candle::Malformed).
#[derive(Debug, Error)]
pub enum Error {
    /// The batch request could not be assembled.
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// The outbound call failed (transport or non-success status).
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider could not be constructed.
    #[error("Provider initialization error: {0}")]
    ProviderInit(#[from] ProviderInitError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// An error related to configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] shared_utils::config::ConfigError),
}

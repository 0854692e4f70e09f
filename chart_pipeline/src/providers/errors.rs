use thiserror::Error;

/// Errors that can occur within a `SeriesProvider` implementation.
///
/// These are the transport failures of the pipeline: they are logged and
/// shown to the user, never retried automatically.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An error during the API request (e.g., connection refused, timeout).
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// An internal error occurred while processing data within the provider.
    #[error("Internal provider error: {0}")]
    Internal(String),
}

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Error)]
pub enum ProviderInitError {
    /// The configured base URL is not an absolute URL.
    #[error("Invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },

    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

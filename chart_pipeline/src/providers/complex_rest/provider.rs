use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared_utils::config::ChartConfig;
use tracing::{debug, warn};
use url::Url;

use crate::{
    models::{response::BatchResponse, series_request::SeriesRequest},
    providers::{ProviderError, ProviderInitError, SeriesProvider},
};

const ENDPOINT_PATH: &str = "complex";

pub struct ComplexDataProvider {
    client: Client,
    endpoint: Url,
}

impl ComplexDataProvider {
    /// Creates a provider posting to `{base_url}/complex`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderInitError> {
        let endpoint = Url::parse(&format!("{}/{ENDPOINT_PATH}", base_url.trim_end_matches('/')))
            .map_err(|source| ProviderInitError::InvalidBaseUrl {
                url: base_url.to_string(),
                source,
            })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &ChartConfig) -> Result<Self, ProviderInitError> {
        Self::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SeriesProvider for ComplexDataProvider {
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<BatchResponse, ProviderError> {
        debug!(
            endpoint = %self.endpoint,
            symbols = ?request.symbols,
            methods = request.methods.len(),
            "posting batch request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            warn!(status = status.as_u16(), body = %message, "batch request rejected");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        // Shape problems are not transport failures; they surface as an empty chart.
        let body = response.bytes().await?;
        let batch = BatchResponse::from_slice(&body);
        if batch.is_error() {
            warn!(
                api_message = batch.message.as_deref().unwrap_or_default(),
                "API reported an error status"
            );
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let provider = ComplexDataProvider::new("http://localhost:6423/", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.endpoint().as_str(), "http://localhost:6423/complex");

        let nested = ComplexDataProvider::new("https://api.example.com/v1", Duration::from_secs(1)).unwrap();
        assert_eq!(nested.endpoint().as_str(), "https://api.example.com/v1/complex");
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let err = ComplexDataProvider::new("localhost", Duration::from_secs(1))
            .err()
            .expect("relative URL must fail");
        assert!(matches!(err, ProviderInitError::InvalidBaseUrl { ref url, .. } if url == "localhost"));
    }

    #[test]
    fn from_config_uses_api_table() {
        let config = ChartConfig::from_toml_str("[api]\nbase_url = \"http://charts.internal:8080\"\n").unwrap();
        let provider = ComplexDataProvider::from_config(&config).unwrap();
        assert_eq!(provider.endpoint().host_str(), Some("charts.internal"));
        assert_eq!(provider.endpoint().path(), "/complex");
    }
}

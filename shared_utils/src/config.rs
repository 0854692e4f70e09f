//! Chart client configuration: parsing, defaults, and environment overrides.
//!
//! The configuration is a small TOML document with three optional tables:
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:6423"
//! timeout_secs = 10
//!
//! [request]
//! timezone = "Europe/Rome"
//! lookback_days = 30
//! order = "ASC"
//!
//! [chart]
//! visible_bars = 50
//! atr_pane_height = 120
//! trend_pane_height = 120
//! ```
//!
//! Every key has a default, so an empty document is a valid configuration.
//! The API base URL can be overridden at runtime with [`BASE_URL_ENV`].
//!
//! Entrypoints:
//! - Parse from a TOML string: [`ChartConfig::from_toml_str`]
//! - Parse from a file path: [`ChartConfig::load`]
//! - Defaults plus environment override: [`ChartConfig::from_env`]

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env::get_env_var;

/// Environment variable holding the base URL of the time-series API.
pub const BASE_URL_ENV: &str = "CHART_API_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:6423";

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config document is not valid TOML or has unexpected keys.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value for `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    pub api: ApiConfig,
    pub request: RequestConfig,
    pub chart: LayoutConfig,
}

/// Where and how to reach the time-series API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL; the batch endpoint path is appended by the client.
    pub base_url: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Defaults applied when building a batch request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    /// IANA zone the API should report datetimes in.
    pub timezone: String,
    /// Days between the start and end date of the default range.
    pub lookback_days: u32,
    /// Sort order, `"ASC"` or `"DESC"`.
    pub order: String,
    /// Optional cap on the number of rows per series.
    pub output_size: Option<u32>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Rome".to_string(),
            lookback_days: 30,
            order: "ASC".to_string(),
            output_size: None,
        }
    }
}

/// Chart geometry defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Bars visible in the default X-axis window.
    pub visible_bars: usize,
    pub atr_pane_height: u32,
    pub trend_pane_height: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            visible_bars: 50,
            atr_pane_height: 120,
            trend_pane_height: 120,
        }
    }
}

impl ChartConfig {
    /// Parse a configuration document and validate it.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let cfg: ChartConfig = toml::from_str(toml_str)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read a configuration file from disk, then apply the environment override.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg = Self::from_toml_str(&text)?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Defaults with the environment override applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Replace the API base URL with [`BASE_URL_ENV`] when it is set.
    pub fn apply_env(&mut self) {
        if let Ok(url) = get_env_var(BASE_URL_ENV) {
            tracing::debug!(base_url = %url, "using API base URL from environment");
            self.api.base_url = url;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "api.base_url",
                message: "must not be empty".into(),
            });
        }
        if self.chart.visible_bars == 0 {
            return Err(ConfigError::Invalid {
                key: "chart.visible_bars",
                message: "must be at least 1".into(),
            });
        }
        if !matches!(self.request.order.trim().to_ascii_uppercase().as_str(), "ASC" | "DESC") {
            return Err(ConfigError::Invalid {
                key: "request.order",
                message: format!("expected ASC or DESC, got {}", self.request.order),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = ChartConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, ChartConfig::default());
        assert_eq!(cfg.api.base_url, "http://localhost:6423");
        assert_eq!(cfg.request.timezone, "Europe/Rome");
        assert_eq!(cfg.chart.visible_bars, 50);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let cfg = ChartConfig::from_toml_str(
            r#"
            [request]
            timezone = "America/New_York"
            output_size = 500
            "#,
        )
        .unwrap();
        assert_eq!(cfg.request.timezone, "America/New_York");
        assert_eq!(cfg.request.output_size, Some(500));
        assert_eq!(cfg.request.lookback_days, 30);
        assert_eq!(cfg.api, ApiConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ChartConfig::from_toml_str("[api]\nbase = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bad_order_is_rejected() {
        let err = ChartConfig::from_toml_str("[request]\norder = \"sideways\"").unwrap_err();
        assert!(err.to_string().contains("request.order"));
    }

    #[test]
    fn order_is_trimmed_and_case_insensitive() {
        let cfg = ChartConfig::from_toml_str("[request]\norder = \" desc \"").unwrap();
        assert_eq!(cfg.request.order, " desc ");
    }

    #[test]
    fn zero_visible_bars_is_rejected() {
        let err = ChartConfig::from_toml_str("[chart]\nvisible_bars = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "chart.visible_bars",
                ..
            }
        ));
    }

    #[test]
    #[serial]
    fn load_reads_file_and_applies_env_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://from-file:1\"\ntimeout_secs = 3").unwrap();

        unsafe { std::env::remove_var(BASE_URL_ENV) };
        let cfg = ChartConfig::load(file.path()).unwrap();
        assert_eq!(cfg.api.base_url, "http://from-file:1");
        assert_eq!(cfg.api.timeout_secs, 3);

        unsafe { std::env::set_var(BASE_URL_ENV, "http://from-env:2") };
        let cfg = ChartConfig::load(file.path()).unwrap();
        assert_eq!(cfg.api.base_url, "http://from-env:2");
        unsafe { std::env::remove_var(BASE_URL_ENV) };
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ChartConfig::load("/definitely/not/here.toml").unwrap_err();
        match err {
            ConfigError::Read { path, .. } => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.toml"))
            }
            other => panic!("expected Read error, got {other:?}"),
        }
    }
}

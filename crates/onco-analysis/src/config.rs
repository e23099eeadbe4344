//! Configuration types for the analysis service client and chart layout.
//!
//! Both configurations follow the builder pattern: defaults match the
//! deployed frontend, and `build()` validates before returning.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default base URL of the analysis backend.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:4000/api";

/// Default timeout for service requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "ONCO_API_URL";

/// Configuration for the analysis service client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the backend API, without a trailing slash.
    /// Default: "http://127.0.0.1:4000/api"
    pub base_url: String,

    /// Request timeout in seconds.
    /// Default: 30
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Load the configuration from the environment.
    ///
    /// Reads a `.env` file when one exists, then `ONCO_API_URL`. Falls back
    /// to the default base URL when the variable is unset.
    pub fn from_env() -> Result<Self, ConfigValidationError> {
        dotenv::dotenv().ok();

        let mut builder = Self::builder();
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            builder = builder.base_url(url);
        }
        builder.build()
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let url = self.base_url.trim();
        if url.is_empty() || !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigValidationError::InvalidBaseUrl(self.base_url.clone()));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout(self.timeout_secs));
        }

        Ok(())
    }
}

/// Builder for [`ServiceConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl ServiceConfigBuilder {
    /// Set the backend base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<ServiceConfig, ConfigValidationError> {
        let config = ServiceConfig {
            base_url: self
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Margins around the plot area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 40.0,
            right: 30.0,
            bottom: 60.0,
            left: 60.0,
        }
    }
}

/// Layout of a chart: outer size and margins.
///
/// Renderers draw in inner plot coordinates, `(0, 0)` being the top-left
/// corner of the area inside the margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Outer width in pixels.
    /// Default: 600
    pub width: f64,

    /// Outer height in pixels.
    /// Default: 400
    pub height: f64,

    /// Default: top 40, right 30, bottom 60, left 60
    pub margin: Margin,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            margin: Margin::default(),
        }
    }
}

impl ChartConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ChartConfigBuilder {
        ChartConfigBuilder::default()
    }

    /// Width of the plot area inside the margins.
    pub fn inner_width(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    /// Height of the plot area inside the margins.
    pub fn inner_height(&self) -> f64 {
        self.height - self.margin.top - self.margin.bottom
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let m = &self.margin;
        let all = [self.width, self.height, m.top, m.right, m.bottom, m.left];
        if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigValidationError::InvalidDimension {
                width: self.width,
                height: self.height,
            });
        }

        if self.inner_width() <= 0.0 || self.inner_height() <= 0.0 {
            return Err(ConfigValidationError::EmptyPlotArea {
                width: self.inner_width(),
                height: self.inner_height(),
            });
        }

        Ok(())
    }
}

/// Builder for [`ChartConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ChartConfigBuilder {
    width: Option<f64>,
    height: Option<f64>,
    margin: Option<Margin>,
}

impl ChartConfigBuilder {
    /// Set the outer width in pixels.
    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the outer height in pixels.
    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Set the margins around the plot area.
    pub fn margin(mut self, margin: Margin) -> Self {
        self.margin = Some(margin);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<ChartConfig, ConfigValidationError> {
        let defaults = ChartConfig::default();
        let config = ChartConfig {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            margin: self.margin.unwrap_or(defaults.margin),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid base URL '{0}' (must start with http:// or https://)")]
    InvalidBaseUrl(String),

    #[error("Invalid timeout: {0} (must be at least 1 second)")]
    InvalidTimeout(u64),

    #[error("Invalid chart dimensions {width}x{height} (must be finite and non-negative)")]
    InvalidDimension { width: f64, height: f64 },

    #[error("Margins leave no plot area ({width}x{height})")]
    EmptyPlotArea { width: f64, height: f64 },
}

//! reqwest-backed client for the analysis REST API.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::AnalysisService;
use crate::config::ServiceConfig;
use crate::summary::DatasetSummary;
use crate::types::{AnalysisRequest, ClinicalRecord, DatasetInfo};

/// Datasets keyed by cancer type, as listed by the backend.
pub type DatasetGroups = BTreeMap<String, Vec<DatasetInfo>>;

/// HTTP client for the analysis backend.
///
/// ```rust,ignore
/// use onco_analysis::config::ServiceConfig;
/// use onco_analysis::service::HttpAnalysisService;
///
/// let service = HttpAnalysisService::new(ServiceConfig::from_env()?)?;
/// let groups = service.list_datasets().await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    config: ServiceConfig,
    client: Client,
}

impl HttpAnalysisService {
    /// Create a client for the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// All datasets, grouped by cancer type.
    pub async fn list_datasets(&self) -> Result<DatasetGroups> {
        self.get_json(&["datasets"]).await
    }

    /// One dataset's metadata.
    pub async fn dataset(&self, id: &str) -> Result<DatasetInfo> {
        self.get_json(&["datasets", id]).await
    }

    /// Patient-level clinical rows of a dataset.
    pub async fn clinical_records(&self, id: &str) -> Result<Vec<ClinicalRecord>> {
        self.get_json(&["datasets", id, "clinical"]).await
    }

    /// Summary statistics of a dataset.
    pub async fn summary(&self, id: &str) -> Result<DatasetSummary> {
        self.get_json(&["datasets", id, "summary"]).await
    }

    /// The base URL extended by `segments`, each one percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let base = &self.config.base_url;
        let mut url = Url::parse(base).with_context(|| format!("Invalid base URL {base}"))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Base URL {} cannot carry a path", base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.url(segments)?;
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let response = Self::check_status(response, "GET", &url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Invalid response body from {url}"))
    }

    async fn check_status(response: Response, method: &str, url: &Url) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        warn!("{} {} failed with status {}", method, url, status);
        Err(anyhow!("Analysis API Error {}: {}", status, text))
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn run(&self, request: &AnalysisRequest) -> Result<Value> {
        let url = self.url(&["datasets", &request.dataset_id, "analysis"])?;
        debug!("POST {} ({})", url, request.analysis_type);

        let response = self
            .client
            .post(url.clone())
            .json(&request.body())
            .send()
            .await?;
        let response = Self::check_status(response, "POST", &url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Invalid analysis result from {url}"))
    }

    fn name(&self) -> &str {
        "http"
    }
}

//! AutoClip API HTTP client.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use aclip_models::{PipelineProgress, ProjectRecord};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::source::{PipelineSource, ProjectSource};

/// Client for the projects and pipeline progress endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    base: Url,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let base_url = config.parsed_base_url()?;
        let base = Url::parse(&base_url)
            .map_err(|e| ClientError::invalid_config(format!("invalid base URL: {}", e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::invalid_config(format!(
                "base URL cannot carry a path: {}",
                base_url
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("aclip-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            http,
            base_url,
            base,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn project_url(&self, project_id: &str) -> Url {
        self.endpoint(&["api", "v1", "projects", project_id])
    }

    fn snapshot_url(&self) -> Url {
        self.endpoint(&["api", "v1", "simple-progress", "snapshot"])
    }

    /// Fetch a project record.
    pub async fn get_project(&self, project_id: &str) -> ClientResult<ProjectRecord> {
        let url = self.project_url(project_id);
        let started = Instant::now();

        let response = self.http.get(url.clone()).send().await?;
        let record = Self::decode(url.as_str(), response).await?;

        debug!(
            project_id = %project_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched project record"
        );
        Ok(record)
    }

    /// Fetch the pipeline progress snapshot for a set of projects.
    pub async fn get_progress_snapshot(
        &self,
        project_ids: &[String],
    ) -> ClientResult<Vec<PipelineProgress>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.snapshot_url();
        let query: Vec<(&str, &str)> = project_ids
            .iter()
            .map(|id| ("project_ids", id.as_str()))
            .collect();

        let response = self.http.get(url.clone()).query(&query).send().await?;
        let snapshot: Vec<PipelineProgress> = Self::decode(url.as_str(), response).await?;

        debug!(
            requested = project_ids.len(),
            received = snapshot.len(),
            "Fetched pipeline progress snapshot"
        );
        Ok(snapshot)
    }

    /// Turn a response into a typed body, mapping non-2xx statuses to errors.
    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_http_status(
                status.as_u16(),
                format!("GET {} failed: {}", url, body),
            ));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::invalid_response(format!("GET {}: {}", url, e)))
    }
}

#[async_trait]
impl ProjectSource for ApiClient {
    async fn fetch_project(&self, project_id: &str) -> ClientResult<ProjectRecord> {
        self.get_project(project_id).await
    }
}

#[async_trait]
impl PipelineSource for ApiClient {
    async fn fetch_snapshot(&self, project_ids: &[String]) -> ClientResult<Vec<PipelineProgress>> {
        self.get_progress_snapshot(project_ids).await
    }
}

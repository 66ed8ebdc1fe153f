//! Marquez HTTP client
//!
//! Talks to the Marquez REST API:
//! - `PUT /api/v1/sources/{name}`
//! - `PUT /api/v1/namespaces/{namespace}/datasets/{name}`
//! - `DELETE /api/v1/namespaces/{namespace}/datasets/{name}`
//! - `POST /api/v1/lineage`
//!
//! Every path parameter is fully percent-encoded, `/` and `:` included, so
//! namespaces like `s3://bucket` survive as a single segment.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let client = MarquezClient::new("http://localhost:5000", "dbt-redshift");
//! client.send_event(&event).await?;
//! ```

use crate::sink::{DatasetId, DatasetRequest, LineageSink, SinkError};
use lineagesync_core::SyncConfig;
use lineagesync_engine::RunEvent;
use serde::Serialize;

/// Environment variable naming the warehouse host
pub const REDSHIFT_HOST_VAR: &str = "REDSHIFT_HOST";

/// Host used when `REDSHIFT_HOST` is unset
pub const DEFAULT_REDSHIFT_HOST: &str = "redshift-cluster";

/// Data source type registered for every source
pub const SOURCE_TYPE: &str = "REDSHIFT";

const REDSHIFT_PORT: u16 = 5439;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceRequest {
    #[serde(rename = "type")]
    source_type: String,

    connection_url: String,

    description: String,
}

/// Marquez lineage sink
#[derive(Debug, Clone)]
pub struct MarquezClient {
    client: reqwest::Client,

    /// Base URL without trailing `/`
    base_url: String,

    /// Source the output datasets are attached to
    source_name: String,

    /// Warehouse host used in source connection URLs
    warehouse_host: String,
}

impl MarquezClient {
    pub fn new(base_url: impl Into<String>, source_name: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            source_name: source_name.into(),
            warehouse_host: DEFAULT_REDSHIFT_HOST.to_string(),
        }
    }

    /// Build a client from the sync configuration and `REDSHIFT_HOST`
    pub fn from_config(config: &SyncConfig) -> Self {
        let client = Self::new(config.marquez.base_url(), config.openlineage.source_name.clone());
        match std::env::var(REDSHIFT_HOST_VAR) {
            Ok(host) if !host.is_empty() => client.with_warehouse_host(&host),
            _ => client,
        }
    }

    /// Set the warehouse host; any `:port` suffix is dropped
    pub fn with_warehouse_host(mut self, host: &str) -> Self {
        let host = host.split(':').next().unwrap_or(host);
        self.warehouse_host = host.to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `redshift://<host>:5439/<source>`
    pub fn connection_url(&self, source_name: &str) -> String {
        format!("redshift://{}:{}/{}", self.warehouse_host, REDSHIFT_PORT, source_name)
    }

    fn source_url(&self, source_name: &str) -> String {
        format!("{}/api/v1/sources/{}", self.base_url, urlencoding::encode(source_name))
    }

    fn dataset_url(&self, dataset: &DatasetId) -> String {
        format!(
            "{}/api/v1/namespaces/{}/datasets/{}",
            self.base_url,
            urlencoding::encode(&dataset.namespace),
            urlencoding::encode(&dataset.name)
        )
    }

    fn lineage_url(&self) -> String {
        format!("{}/api/v1/lineage", self.base_url)
    }

    /// Send a request and turn non-2xx responses into errors carrying the body
    async fn execute(&self, url: &str, request: reqwest::RequestBuilder) -> Result<(), SinkError> {
        let response = request
            .send()
            .await
            .map_err(|e| SinkError::RequestError(url.to_string(), e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::HttpError(url.to_string(), status.as_u16(), body))
    }
}

#[async_trait::async_trait]
impl LineageSink for MarquezClient {
    fn name(&self) -> &'static str {
        "Marquez"
    }

    async fn create_source(&self, source_name: &str) -> Result<(), SinkError> {
        let url = self.source_url(source_name);
        let payload = SourceRequest {
            source_type: SOURCE_TYPE.to_string(),
            connection_url: self.connection_url(source_name),
            description: format!("{} data source", source_name),
        };

        tracing::debug!(url = %url, "Creating source");
        match self.execute(&url, self.client.put(&url).json(&payload)).await {
            Ok(()) => {
                tracing::info!("Source created: {}", source_name);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to create source {}: {}", source_name, e);
                Err(e)
            }
        }
    }

    async fn create_dataset(&self, dataset: &DatasetId, request: &DatasetRequest) -> Result<(), SinkError> {
        self.create_source(&request.source_name).await?;

        let url = self.dataset_url(dataset);
        tracing::debug!(url = %url, payload = ?request, "Creating dataset");

        match self.execute(&url, self.client.put(&url).json(request)).await {
            Ok(()) => {
                tracing::info!("Dataset created: {} with source: {}", dataset.name, request.source_name);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to create dataset {}: {}", dataset.name, e);
                Err(e)
            }
        }
    }

    async fn send_event(&self, event: &RunEvent) -> Result<(), SinkError> {
        if let Some((dataset, request)) = DatasetRequest::for_output(event, &self.source_name) {
            if let Err(e) = self.create_dataset(&dataset, &request).await {
                tracing::warn!("Dataset pre-creation warning: {}", e);
            }
        }

        let url = self.lineage_url();
        match self.execute(&url, self.client.post(&url).json(event)).await {
            Ok(()) => {
                tracing::info!("Event sent: {}", event.job.name);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to send event {}: {}", event.job.name, e);
                Err(e)
            }
        }
    }

    async fn delete_dataset(&self, dataset: &DatasetId) -> Result<(), SinkError> {
        let url = self.dataset_url(dataset);
        match self.execute(&url, self.client.delete(&url)).await {
            Ok(()) => {
                tracing::info!("Dataset deleted: {}", dataset.name);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to delete dataset {}: {}", dataset.name, e);
                Err(e)
            }
        }
    }
}

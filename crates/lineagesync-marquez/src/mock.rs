//! In-memory lineage sink for testing
//!
//! Records every source, dataset and event it receives instead of talking to
//! a server. Failures can be simulated for all events or for specific models.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let sink = MockSink::new();
//! sink.fail_model("orders").await;
//!
//! let report = SyncRunner::new(&manifest, config, &sink).run(None).await;
//! assert_eq!(sink.event_count().await, report.summary.models_synced);
//! ```

use crate::sink::{DatasetId, DatasetRequest, LineageSink, SinkError};
use indexmap::IndexMap;
use lineagesync_engine::RunEvent;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock lineage sink
///
/// Clones share the same recorded state.
#[derive(Clone)]
pub struct MockSink {
    /// Delivered events in order
    events: Arc<RwLock<Vec<RunEvent>>>,

    /// Registered datasets by `namespace:name`
    datasets: Arc<RwLock<IndexMap<String, DatasetRequest>>>,

    /// Registered source names
    sources: Arc<RwLock<Vec<String>>>,

    /// Models whose events are rejected
    failing_models: Arc<RwLock<HashSet<String>>>,

    /// Reject every event
    fail_all: bool,

    /// Source name used for output dataset registration
    source_name: String,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            datasets: Arc::new(RwLock::new(IndexMap::new())),
            sources: Arc::new(RwLock::new(Vec::new())),
            failing_models: Arc::new(RwLock::new(HashSet::new())),
            fail_all: false,
            source_name: "mock-source".to_string(),
        }
    }

    /// Reject every event
    pub fn with_failure(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Attach output datasets to `source_name`
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }

    /// Reject events for the model named `model`
    pub async fn fail_model(&self, model: impl Into<String>) {
        self.failing_models.write().await.insert(model.into());
    }

    pub async fn events(&self) -> Vec<RunEvent> {
        self.events.read().await.clone()
    }

    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Event delivered for `model`, if any
    pub async fn event_for(&self, model: &str) -> Option<RunEvent> {
        self.events
            .read()
            .await
            .iter()
            .find(|event| event.model_name() == model)
            .cloned()
    }

    pub async fn has_dataset(&self, dataset: &DatasetId) -> bool {
        self.datasets.read().await.contains_key(&dataset.to_string())
    }

    pub async fn dataset(&self, dataset: &DatasetId) -> Option<DatasetRequest> {
        self.datasets.read().await.get(&dataset.to_string()).cloned()
    }

    pub async fn sources(&self) -> Vec<String> {
        self.sources.read().await.clone()
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LineageSink for MockSink {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn create_source(&self, source_name: &str) -> Result<(), SinkError> {
        let mut sources = self.sources.write().await;
        if !sources.iter().any(|s| s == source_name) {
            sources.push(source_name.to_string());
        }
        Ok(())
    }

    async fn create_dataset(&self, dataset: &DatasetId, request: &DatasetRequest) -> Result<(), SinkError> {
        self.create_source(&request.source_name).await?;
        self.datasets
            .write()
            .await
            .insert(dataset.to_string(), request.clone());
        Ok(())
    }

    async fn send_event(&self, event: &RunEvent) -> Result<(), SinkError> {
        if self.fail_all || self.failing_models.read().await.contains(event.model_name()) {
            return Err(SinkError::Rejected(event.job.name.clone()));
        }

        if let Some((dataset, request)) = DatasetRequest::for_output(event, &self.source_name) {
            self.create_dataset(&dataset, &request).await?;
        }
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn delete_dataset(&self, dataset: &DatasetId) -> Result<(), SinkError> {
        match self.datasets.write().await.shift_remove(&dataset.to_string()) {
            Some(_) => Ok(()),
            None => Err(SinkError::Rejected(format!("dataset not found: {}", dataset))),
        }
    }
}

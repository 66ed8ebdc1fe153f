//! Sink that prints events instead of sending them

use crate::sink::{DatasetId, DatasetRequest, LineageSink, SinkError};
use lineagesync_engine::RunEvent;
use std::io::Write;
use std::sync::Mutex;

/// Writes each event as `--- Event for <model> ---` followed by pretty JSON
///
/// Dataset and source registration are no-ops.
pub struct DryRunSink<W: Write + Send> {
    out: Mutex<W>,
}

impl DryRunSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> DryRunSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_event(&self, event: &RunEvent) -> Result<(), SinkError> {
        let json = serde_json::to_string_pretty(event)
            .map_err(|e| SinkError::Rejected(e.to_string()))?;

        let mut out = self
            .out
            .lock()
            .map_err(|_| SinkError::Rejected("output lock poisoned".to_string()))?;
        writeln!(out, "--- Event for {} ---", event.model_name())
            .and_then(|_| writeln!(out, "{}", json))
            .map_err(|e| SinkError::Rejected(e.to_string()))
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> LineageSink for DryRunSink<W> {
    fn name(&self) -> &'static str {
        "DryRun"
    }

    async fn create_source(&self, _source_name: &str) -> Result<(), SinkError> {
        Ok(())
    }

    async fn create_dataset(&self, _dataset: &DatasetId, _request: &DatasetRequest) -> Result<(), SinkError> {
        Ok(())
    }

    async fn send_event(&self, event: &RunEvent) -> Result<(), SinkError> {
        self.write_event(event)
    }

    async fn delete_dataset(&self, dataset: &DatasetId) -> Result<(), SinkError> {
        tracing::info!("Dry run: would delete dataset {}", dataset);
        Ok(())
    }
}

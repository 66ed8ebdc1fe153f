//! Sync runner: manifest models to lineage sink

use crate::sink::LineageSink;
use lineagesync_core::{Diagnostic, DiagnosticCode, OpenLineageConfig, SyncReport};
use lineagesync_engine::EventBuilder;
use lineagesync_manifest::Manifest;

/// Builds one event per model and hands it to a sink
pub struct SyncRunner<'a, S: LineageSink + ?Sized> {
    manifest: &'a Manifest,
    config: OpenLineageConfig,
    sink: &'a S,
}

impl<'a, S: LineageSink + ?Sized> SyncRunner<'a, S> {
    pub fn new(manifest: &'a Manifest, config: OpenLineageConfig, sink: &'a S) -> Self {
        Self { manifest, config, sink }
    }

    /// Sync every model in manifest order, or only the model named `model`
    ///
    /// Failed emissions are logged, counted and never retried.
    pub async fn run(&self, model: Option<&str>) -> SyncReport {
        let builder = EventBuilder::new(self.manifest, self.config.clone());
        let mut report = SyncReport::new();

        for (node_id, node) in self.manifest.models() {
            if model.is_some_and(|name| node.name.as_deref() != Some(name)) {
                continue;
            }

            tracing::info!("Processing: {}", node.display_name());

            let Some(built) = builder.build(node_id) else {
                continue;
            };
            report.extend_diagnostics(built.diagnostics);

            match self.sink.send_event(&built.event).await {
                Ok(()) => report.record_synced(),
                Err(e) => report.record_failed(
                    Diagnostic::new(
                        DiagnosticCode::EmissionFailed,
                        format!("{} sink rejected {}: {}", self.sink.name(), built.event.job.name, e),
                    )
                    .with_node(node_id),
                ),
            }
        }

        if model.is_some() && report.summary.models_total == 0 {
            tracing::warn!("No model named '{}' in manifest", model.unwrap_or_default());
        }

        tracing::info!(
            "Sync completed: {}/{} successful",
            report.summary.models_synced,
            report.summary.models_total
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSink;
    use crate::sink::DatasetId;
    use lineagesync_core::Severity;
    use pretty_assertions::assert_eq;

    fn manifest() -> Manifest {
        Manifest::from_str(
            &serde_json::json!({
                "nodes": {
                    "source.raw": {"nodeType": "source", "database": "db", "schema": "raw", "name": "raw",
                                   "columns": {"id": {}, "amount": {}}},
                    "model.a": {"nodeType": "model", "database": "db", "schema": "s", "name": "a",
                                "columns": {"id": {}, "missing": {}}, "dependsOn": ["source.raw"],
                                "compiledCode": "SELECT id FROM raw"},
                    "model.b": {"nodeType": "model", "database": "db", "schema": "s", "name": "b",
                                "columns": {"total": {}}, "dependsOn": ["source.raw"],
                                "compiledCode": "SELECT SUM(amount) AS total FROM raw"},
                    "test.x": {"nodeType": "test", "name": "x"}
                }
            })
            .to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sync_all_models() {
        let manifest = manifest();
        let sink = MockSink::new();
        let report = SyncRunner::new(&manifest, OpenLineageConfig::default(), &sink)
            .run(None)
            .await;

        assert_eq!(report.summary.models_total, 2);
        assert_eq!(report.summary.models_synced, 2);
        assert_eq!(report.summary.models_failed, 0);
        assert_eq!(report.summary.warnings, 1);
        assert!(!report.has_errors());

        let jobs: Vec<_> = sink.events().await.into_iter().map(|e| e.job.name).collect();
        assert_eq!(jobs, vec!["dbt_run_a", "dbt_run_b"]);
        assert!(sink.has_dataset(&DatasetId::new("s3://lineage-landing-zone", "db.s.a")).await);
    }

    #[tokio::test]
    async fn test_sync_single_model() {
        let manifest = manifest();
        let sink = MockSink::new();
        let report = SyncRunner::new(&manifest, OpenLineageConfig::default(), &sink)
            .run(Some("b"))
            .await;

        assert_eq!(report.summary.models_total, 1);
        assert_eq!(sink.event_count().await, 1);
        assert!(sink.event_for("b").await.is_some());
    }

    #[tokio::test]
    async fn test_unknown_model_syncs_nothing() {
        let manifest = manifest();
        let sink = MockSink::new();
        let report = SyncRunner::new(&manifest, OpenLineageConfig::default(), &sink)
            .run(Some("nope"))
            .await;

        assert_eq!(report.summary.models_total, 0);
        assert_eq!(sink.event_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_emission_is_counted_not_retried() {
        let manifest = manifest();
        let sink = MockSink::new();
        sink.fail_model("a").await;

        let report = SyncRunner::new(&manifest, OpenLineageConfig::default(), &sink)
            .run(None)
            .await;

        assert_eq!(report.summary.models_synced, 1);
        assert_eq!(report.summary.models_failed, 1);
        assert!(report.has_errors());

        let error = report
            .diagnostics
            .iter()
            .find(|d| d.severity == Severity::Error)
            .unwrap();
        assert_eq!(error.code, DiagnosticCode::EmissionFailed);
        assert_eq!(error.node_id.as_deref(), Some("model.a"));
        assert_eq!(sink.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_works_through_trait_object() {
        let manifest = manifest();
        let sink = MockSink::new().with_failure();
        let dyn_sink: &dyn LineageSink = &sink;

        let report = SyncRunner::new(&manifest, OpenLineageConfig::default(), dyn_sink)
            .run(None)
            .await;
        assert_eq!(report.summary.models_failed, 2);
    }
}

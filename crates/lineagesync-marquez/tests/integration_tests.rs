//! Integration tests for syncing a manifest to a Marquez server
//!
//! A wiremock server stands in for Marquez; no real instance is needed.

use lineagesync_core::{DiagnosticCode, SyncConfig};
use lineagesync_manifest::Manifest;
use lineagesync_marquez::{DryRunSink, MarquezClient, SyncRunner};
use pretty_assertions::assert_eq;
use std::path::Path;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture() -> Manifest {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../lineagesync-engine/tests/fixtures/colibri-manifest.json");
    Manifest::from_file(&path).unwrap()
}

fn config_for(server: &MockServer) -> SyncConfig {
    let mut config = SyncConfig::default();
    config.marquez.url = server.uri();
    config
}

#[tokio::test]
async fn sync_fixture_to_marquez() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/sources/dbt-redshift"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/api/v1/namespaces/s3%3A%2F%2Flineage-landing-zone/datasets/analytics\.(staging|marts)\.\w+$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/lineage"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let manifest = load_fixture();
    let config = config_for(&server);
    let client = MarquezClient::from_config(&config);
    let report = SyncRunner::new(&manifest, config.openlineage.clone(), &client)
        .run(None)
        .await;

    assert_eq!(report.summary.models_total, 2);
    assert_eq!(report.summary.models_synced, 2);
    assert_eq!(report.summary.warnings, 2);
    assert!(!report.has_errors());
}

#[tokio::test]
async fn marquez_outage_fails_every_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/lineage"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let manifest = load_fixture();
    let config = config_for(&server);
    let client = MarquezClient::from_config(&config);
    let report = SyncRunner::new(&manifest, config.openlineage.clone(), &client)
        .run(Some("customer_orders"))
        .await;

    assert_eq!(report.summary.models_total, 1);
    assert_eq!(report.summary.models_failed, 1);

    let failure = report
        .diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::EmissionFailed)
        .unwrap();
    assert!(failure.message.contains("maintenance"));
    assert_eq!(server.received_requests().await.unwrap().iter().filter(|r| r.method.as_str() == "POST").count(), 1);
}

#[tokio::test]
async fn dry_run_prints_every_model() {
    let manifest = load_fixture();
    let sink = DryRunSink::new(Vec::new());
    let report = SyncRunner::new(&manifest, SyncConfig::default().openlineage, &sink)
        .run(None)
        .await;
    assert_eq!(report.summary.models_synced, 2);

    let printed = String::from_utf8(sink.into_inner()).unwrap();
    let headers: Vec<_> = printed.lines().filter(|l| l.starts_with("--- Event for")).collect();
    assert_eq!(
        headers,
        vec!["--- Event for stg_customers ---", "--- Event for customer_orders ---"]
    );
}

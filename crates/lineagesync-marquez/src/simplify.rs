//! Marquez lineage graph simplification
//!
//! Reduces a `GET /api/v1/lineage` response to datasets, jobs and edges,
//! dropping timestamps, descriptions, facets and run history.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Errors that can occur while simplifying a lineage graph
#[derive(Debug, thiserror::Error)]
pub enum SimplifyError {
    #[error("Failed to read {0}: {1}")]
    IoError(String, String),

    #[error("Failed to fetch {0}: {1}")]
    FetchError(String, String),

    #[error("Failed to parse lineage graph: {0}")]
    ParseError(String),
}

/// Raw lineage API response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineageGraph {
    #[serde(default)]
    pub graph: Vec<GraphNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    #[serde(default)]
    pub id: Option<String>,

    /// `DATASET` or `JOB`
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,

    #[serde(default)]
    pub data: Option<NodeData>,

    #[serde(default)]
    pub in_edges: Option<Vec<GraphEdge>>,

    #[serde(default)]
    pub out_edges: Option<Vec<GraphEdge>>,
}

/// Union of the dataset and job payload fields we keep
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub simple_name: Option<String>,

    #[serde(default)]
    pub fields: Option<Vec<FieldRef>>,

    #[serde(default)]
    pub inputs: Option<Vec<DatasetRef>>,

    #[serde(default)]
    pub outputs: Option<Vec<DatasetRef>>,

    #[serde(default)]
    pub latest_run: Option<LatestRun>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetRef {
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

impl DatasetRef {
    /// `namespace:name`
    fn key(&self) -> String {
        format!(
            "{}:{}",
            self.namespace.as_deref().unwrap_or_default(),
            self.name.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestRun {
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphEdge {
    #[serde(default)]
    pub origin: Option<String>,

    #[serde(default)]
    pub destination: Option<String>,
}

/// Simplified graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedLineage {
    pub datasets: Vec<SimpleDataset>,

    pub jobs: Vec<SimpleJob>,

    /// Unique edges in first-seen order
    pub edges: Vec<SimpleEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleDataset {
    pub id: Option<String>,

    pub name: Option<String>,

    /// Field names; unnamed fields are dropped
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleJob {
    pub id: Option<String>,

    /// `simpleName`, falling back to `name`
    pub name: Option<String>,

    /// `namespace:name` of each input dataset
    pub inputs: Vec<String>,

    /// `namespace:name` of each output dataset
    pub outputs: Vec<String>,

    /// State of the latest run
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimpleEdge {
    pub from: Option<String>,

    pub to: Option<String>,
}

/// Input and output sizes, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplifyStats {
    pub original_size: usize,

    pub simplified_size: usize,
}

impl SimplifyStats {
    /// Size reduction in percent; 0 for empty input
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.simplified_size as f64 / self.original_size as f64) * 100.0
    }
}

impl std::fmt::Display for SimplifyStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Data compression: {} -> {} characters (reduced {:.1}%)",
            self.original_size,
            self.simplified_size,
            self.reduction_percent()
        )
    }
}

/// Reduce a parsed lineage graph
pub fn simplify_lineage(graph: &LineageGraph) -> SimplifiedLineage {
    let mut simplified = SimplifiedLineage::default();
    let mut edges: IndexSet<SimpleEdge> = IndexSet::new();

    for node in &graph.graph {
        let data = node.data.clone().unwrap_or_default();

        match node.node_type.as_deref() {
            Some("DATASET") => simplified.datasets.push(SimpleDataset {
                id: node.id.clone(),
                name: data.name,
                fields: data
                    .fields
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|field| field.name.filter(|name| !name.is_empty()))
                    .collect(),
            }),
            Some("JOB") => simplified.jobs.push(SimpleJob {
                id: node.id.clone(),
                name: data.simple_name.filter(|name| !name.is_empty()).or(data.name),
                inputs: data.inputs.unwrap_or_default().iter().map(DatasetRef::key).collect(),
                outputs: data.outputs.unwrap_or_default().iter().map(DatasetRef::key).collect(),
                state: data.latest_run.and_then(|run| run.state),
            }),
            _ => {}
        }

        let node_edges = node.in_edges.iter().chain(node.out_edges.iter()).flatten();
        for edge in node_edges {
            edges.insert(SimpleEdge {
                from: edge.origin.clone(),
                to: edge.destination.clone(),
            });
        }
    }

    simplified.edges = edges.into_iter().collect();
    simplified
}

/// Parse and reduce a raw lineage API response
pub fn simplify_str(raw: &str) -> Result<(SimplifiedLineage, SimplifyStats), SimplifyError> {
    let graph: LineageGraph =
        serde_json::from_str(raw).map_err(|e| SimplifyError::ParseError(e.to_string()))?;
    let simplified = simplify_lineage(&graph);

    let simplified_json =
        serde_json::to_string(&simplified).map_err(|e| SimplifyError::ParseError(e.to_string()))?;
    let stats = SimplifyStats {
        original_size: raw.chars().count(),
        simplified_size: simplified_json.chars().count(),
    };

    Ok((simplified, stats))
}

/// Fetch a raw lineage API response
pub async fn fetch_lineage(url: &str) -> Result<String, SimplifyError> {
    let response = reqwest::Client::new()
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| SimplifyError::FetchError(url.to_string(), e.to_string()))?;

    response
        .text()
        .await
        .map_err(|e| SimplifyError::FetchError(url.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw_graph() -> String {
        json!({
            "graph": [
                {
                    "id": "dataset:lake:db.raw.orders",
                    "type": "DATASET",
                    "data": {
                        "name": "db.raw.orders",
                        "description": "Raw orders",
                        "createdAt": "2024-01-01T00:00:00Z",
                        "fields": [{"name": "id", "type": "INTEGER"}, {"type": "VARCHAR"}, {"name": "amount"}],
                        "facets": {"schema": {"_producer": "x"}}
                    },
                    "inEdges": [],
                    "outEdges": [{"origin": "dataset:lake:db.raw.orders", "destination": "job:lake:dbt_run_orders"}]
                },
                {
                    "id": "job:lake:dbt_run_orders",
                    "type": "JOB",
                    "data": {
                        "name": "dbt_run_orders",
                        "simpleName": "orders",
                        "inputs": [{"namespace": "lake", "name": "db.raw.orders"}],
                        "outputs": [{"namespace": "lake", "name": "db.marts.orders"}],
                        "latestRun": {"state": "COMPLETED", "durationMs": 12}
                    },
                    "inEdges": [{"origin": "dataset:lake:db.raw.orders", "destination": "job:lake:dbt_run_orders"}],
                    "outEdges": [{"origin": "job:lake:dbt_run_orders", "destination": "dataset:lake:db.marts.orders"}]
                },
                {
                    "id": "job:lake:adhoc",
                    "type": "JOB",
                    "data": {"name": "adhoc", "latestRun": null}
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_simplify_graph() {
        let (simplified, _) = simplify_str(&raw_graph()).unwrap();

        assert_eq!(
            simplified.datasets,
            vec![SimpleDataset {
                id: Some("dataset:lake:db.raw.orders".into()),
                name: Some("db.raw.orders".into()),
                fields: vec!["id".into(), "amount".into()],
            }]
        );

        assert_eq!(simplified.jobs.len(), 2);
        assert_eq!(
            simplified.jobs[0],
            SimpleJob {
                id: Some("job:lake:dbt_run_orders".into()),
                name: Some("orders".into()),
                inputs: vec!["lake:db.raw.orders".into()],
                outputs: vec!["lake:db.marts.orders".into()],
                state: Some("COMPLETED".into()),
            }
        );
        assert_eq!(simplified.jobs[1].name.as_deref(), Some("adhoc"));
        assert_eq!(simplified.jobs[1].state, None);
    }

    #[test]
    fn test_edges_deduplicated_in_order() {
        let (simplified, _) = simplify_str(&raw_graph()).unwrap();
        let edges: Vec<_> = simplified
            .edges
            .iter()
            .map(|e| (e.from.as_deref().unwrap(), e.to.as_deref().unwrap()))
            .collect();

        assert_eq!(
            edges,
            vec![
                ("dataset:lake:db.raw.orders", "job:lake:dbt_run_orders"),
                ("job:lake:dbt_run_orders", "dataset:lake:db.marts.orders"),
            ]
        );
    }

    #[test]
    fn test_stats() {
        let (_, stats) = simplify_str(&raw_graph()).unwrap();
        assert!(stats.simplified_size < stats.original_size);
        assert!(stats.reduction_percent() > 0.0);
        assert!(stats.to_string().starts_with("Data compression: "));

        let empty = SimplifyStats { original_size: 0, simplified_size: 0 };
        assert_eq!(empty.reduction_percent(), 0.0);
    }

    #[test]
    fn test_missing_graph_is_empty() {
        let (simplified, _) = simplify_str("{}").unwrap();
        assert_eq!(simplified, SimplifiedLineage::default());
        assert!(simplify_str("not json").is_err());
    }

    #[tokio::test]
    async fn test_fetch_lineage() {
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/lineage"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(raw_graph()))
            .mount(&server)
            .await;

        let raw = fetch_lineage(&format!("{}/api/v1/lineage", server.uri())).await.unwrap();
        assert_eq!(raw, raw_graph());

        let missing = fetch_lineage(&format!("{}/other", server.uri())).await;
        assert!(matches!(missing, Err(SimplifyError::FetchError(_, _))));
    }
}

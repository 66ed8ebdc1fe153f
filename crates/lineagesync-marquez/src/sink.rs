//! Lineage sink trait for delivering events and dataset metadata

use lineagesync_engine::RunEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a dataset inside a lineage namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetId {
    /// Lineage namespace
    pub namespace: String,

    /// Dataset name (`database.schema.table`)
    pub name: String,
}

impl DatasetId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// Dataset field as registered with the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetField {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: String,
}

/// Body of a dataset registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRequest {
    /// Always `DB_TABLE`
    #[serde(rename = "type")]
    pub dataset_type: String,

    /// `database.schema.table` in the warehouse
    pub physical_name: String,

    /// Data source the dataset belongs to
    pub source_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<DatasetField>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DatasetRequest {
    pub const DB_TABLE: &'static str = "DB_TABLE";

    pub fn new(physical_name: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            dataset_type: Self::DB_TABLE.to_string(),
            physical_name: physical_name.into(),
            source_name: source_name.into(),
            fields: None,
            description: None,
        }
    }

    /// Registration for the output dataset of `event`, attached to `source_name`
    ///
    /// The dataset name is split on `.`; with fewer than three parts the
    /// database and schema are `unknown` and the whole name is the table.
    pub fn for_output(event: &RunEvent, source_name: &str) -> Option<(DatasetId, Self)> {
        let output = event.output()?;

        let parts: Vec<&str> = output.name.split('.').collect();
        let (database, schema, table) = if parts.len() >= 3 {
            (parts[0], parts[1], parts[2])
        } else {
            ("unknown", "unknown", output.name.as_str())
        };

        let fields: Vec<DatasetField> = output
            .facets
            .schema
            .fields
            .iter()
            .map(|field| DatasetField {
                name: field.name.clone(),
                field_type: field.field_type.clone(),
            })
            .collect();

        let mut request = Self::new(format!("{}.{}.{}", database, schema, table), source_name);
        request.fields = (!fields.is_empty()).then_some(fields);
        request.description = Some(format!("dbt model: {}.{}", schema, table));

        Some((DatasetId::new(&output.namespace, &output.name), request))
    }
}

/// Errors that can occur when talking to a sink
#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    #[error("Request to {0} failed: {1}")]
    RequestError(String, String),

    #[error("{0} returned HTTP {1}: {2}")]
    HttpError(String, u16, String),

    #[error("Event rejected: {0}")]
    Rejected(String),
}

/// Destination for lineage events
///
/// Delivery is at-most-once: implementations never retry.
#[async_trait::async_trait]
pub trait LineageSink: Send + Sync {
    /// Sink name for logs (e.g., "Marquez", "DryRun")
    fn name(&self) -> &'static str;

    /// Register a data source
    async fn create_source(&self, source_name: &str) -> Result<(), SinkError>;

    /// Register a dataset, creating its data source first
    async fn create_dataset(&self, dataset: &DatasetId, request: &DatasetRequest) -> Result<(), SinkError>;

    /// Deliver one run event
    async fn send_event(&self, event: &RunEvent) -> Result<(), SinkError>;

    /// Remove a dataset
    async fn delete_dataset(&self, dataset: &DatasetId) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineagesync_engine::{Dataset, DatasetFacets, EventType, Job, JobFacets, Run, SchemaFacet, SchemaField};
    use pretty_assertions::assert_eq;

    fn event_with_output(name: &str, fields: Vec<SchemaField>) -> RunEvent {
        RunEvent {
            event_type: EventType::Complete,
            event_time: "2024-01-01T00:00:00.000Z".into(),
            run: Run { run_id: "r".into() },
            job: Job {
                namespace: "ns".into(),
                name: "dbt_run_t".into(),
                facets: JobFacets::default(),
            },
            inputs: vec![],
            outputs: vec![Dataset {
                namespace: "ns".into(),
                name: name.into(),
                facets: DatasetFacets {
                    schema: SchemaFacet {
                        producer: "p".into(),
                        schema_url: "u".into(),
                        fields,
                    },
                    column_lineage: None,
                },
            }],
            producer: "p".into(),
        }
    }

    #[test]
    fn test_dataset_id() {
        let id = DatasetId::new("s3://lake", "db.s.t");
        assert_eq!(id.to_string(), "s3://lake:db.s.t");
    }

    #[test]
    fn test_output_request_three_parts() {
        let field = SchemaField {
            name: "id".into(),
            field_type: "integer".into(),
            description: "".into(),
        };
        let event = event_with_output("analytics.marts.orders", vec![field]);
        let (id, request) = DatasetRequest::for_output(&event, "dbt-redshift").unwrap();

        assert_eq!(id, DatasetId::new("ns", "analytics.marts.orders"));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "type": "DB_TABLE",
                "physicalName": "analytics.marts.orders",
                "sourceName": "dbt-redshift",
                "fields": [{"name": "id", "type": "integer"}],
                "description": "dbt model: marts.orders"
            })
        );
    }

    #[test]
    fn test_output_request_short_name() {
        let event = event_with_output("orders", vec![]);
        let (_, request) = DatasetRequest::for_output(&event, "src").unwrap();

        assert_eq!(request.physical_name, "unknown.unknown.orders");
        assert_eq!(request.description.as_deref(), Some("dbt model: unknown.orders"));
        assert!(request.fields.is_none());
    }
}

//! OpenLineage run events
//!
//! One `COMPLETE` event per model node, carrying the output schema and, when
//! any lineage was assembled, the column lineage facet on both the job and
//! the output dataset.

use crate::assembler::LineageAssembler;
use chrono::{DateTime, SecondsFormat, Utc};
use lineagesync_core::{ColumnLineageMap, Diagnostic, OpenLineageConfig};
use lineagesync_manifest::Manifest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SCHEMA_FACET_URL: &str = "https://openlineage.io/spec/facets/1-0-0/SchemaDatasetFacet.json";
pub const JOB_COLUMN_LINEAGE_URL: &str =
    "https://openlineage.io/spec/facets/1-0-0/ColumnLineageJobFacet.json";
pub const DATASET_COLUMN_LINEAGE_URL: &str =
    "https://openlineage.io/spec/facets/1-0-0/ColumnLineageDatasetFacet.json";

/// Job names are `dbt_run_<model name>`
pub const JOB_NAME_PREFIX: &str = "dbt_run_";

/// Schema field type used when the manifest declares none
pub const DEFAULT_FIELD_TYPE: &str = "string";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Start,
    Complete,
    Fail,
}

/// OpenLineage run event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvent {
    pub event_type: EventType,

    /// ISO-8601 UTC with millisecond precision and a `Z` suffix
    pub event_time: String,

    pub run: Run,

    pub job: Job,

    /// Upstream datasets, unique by name
    pub inputs: Vec<Dataset>,

    /// Always exactly one dataset: the model itself
    pub outputs: Vec<Dataset>,

    pub producer: String,
}

impl RunEvent {
    /// Model name recovered from the job name
    pub fn model_name(&self) -> &str {
        self.job
            .name
            .strip_prefix(JOB_NAME_PREFIX)
            .unwrap_or(&self.job.name)
    }

    /// The model's dataset
    pub fn output(&self) -> Option<&Dataset> {
        self.outputs.first()
    }

    /// Column lineage carried by the event, if any
    pub fn column_lineage(&self) -> Option<&ColumnLineageMap> {
        self.job.facets.column_lineage.as_ref().map(|facet| &facet.fields)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub run_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub namespace: String,

    pub name: String,

    #[serde(default)]
    pub facets: JobFacets,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFacets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_lineage: Option<ColumnLineageFacet>,
}

/// Input or output dataset reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub namespace: String,

    /// `database.schema.name`
    pub name: String,

    pub facets: DatasetFacets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetFacets {
    pub schema: SchemaFacet,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_lineage: Option<ColumnLineageFacet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaFacet {
    #[serde(rename = "_producer")]
    pub producer: String,

    #[serde(rename = "_schemaURL")]
    pub schema_url: String,

    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: String,

    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLineageFacet {
    #[serde(rename = "_producer")]
    pub producer: String,

    #[serde(rename = "_schemaURL")]
    pub schema_url: String,

    pub fields: ColumnLineageMap,
}

/// An event plus the warnings raised while assembling its lineage
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltEvent {
    pub event: RunEvent,

    pub diagnostics: Vec<Diagnostic>,
}

/// Builds run events from a manifest under an explicit configuration
pub struct EventBuilder<'a> {
    manifest: &'a Manifest,
    config: OpenLineageConfig,
}

impl<'a> EventBuilder<'a> {
    pub fn new(manifest: &'a Manifest, config: OpenLineageConfig) -> Self {
        Self { manifest, config }
    }

    /// Build the event for `node_id`, stamped now with a fresh run id
    ///
    /// Returns `None` for unknown ids and source nodes.
    pub fn build(&self, node_id: &str) -> Option<BuiltEvent> {
        self.build_at(node_id, Utc::now(), Uuid::new_v4())
    }

    /// Build the event for `node_id` with a fixed time and run id
    pub fn build_at(&self, node_id: &str, time: DateTime<Utc>, run_id: Uuid) -> Option<BuiltEvent> {
        let node = self.manifest.get_node(node_id)?;
        if node.is_source() {
            return None;
        }

        let namespace = &self.config.root_namespace;
        let lineage = LineageAssembler::new(self.manifest, namespace.as_str()).assemble(node_id);

        let fields = node
            .columns
            .iter()
            .map(|(name, meta)| SchemaField {
                name: name.clone(),
                field_type: meta
                    .data_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FIELD_TYPE.to_string()),
                description: meta.description.clone().unwrap_or_default(),
            })
            .collect();

        let (job_lineage, dataset_lineage) = if lineage.columns.is_empty() {
            (None, None)
        } else {
            (
                Some(self.column_lineage_facet(JOB_COLUMN_LINEAGE_URL, &lineage.columns)),
                Some(self.column_lineage_facet(DATASET_COLUMN_LINEAGE_URL, &lineage.columns)),
            )
        };

        let event = RunEvent {
            event_type: EventType::Complete,
            event_time: time.to_rfc3339_opts(SecondsFormat::Millis, true),
            run: Run {
                run_id: run_id.to_string(),
            },
            job: Job {
                namespace: namespace.clone(),
                name: format!("{}{}", JOB_NAME_PREFIX, node.display_name()),
                facets: JobFacets {
                    column_lineage: job_lineage,
                },
            },
            inputs: self.inputs(node_id),
            outputs: vec![Dataset {
                namespace: namespace.clone(),
                name: node.qualified_name(),
                facets: DatasetFacets {
                    schema: self.schema_facet(fields),
                    column_lineage: dataset_lineage,
                },
            }],
            producer: self.config.producer.clone(),
        };

        tracing::debug!(
            node = node_id,
            columns = lineage.columns.len(),
            warnings = lineage.diagnostics.len(),
            "Built lineage event"
        );

        Some(BuiltEvent {
            event,
            diagnostics: lineage.diagnostics,
        })
    }

    /// Datasets of every existing node with an edge into `node_id`, unique by name
    fn inputs(&self, node_id: &str) -> Vec<Dataset> {
        let mut inputs: Vec<Dataset> = Vec::new();

        for edge in self.manifest.edges_into(node_id) {
            let Some(source) = self.manifest.get_node(&edge.source) else {
                continue;
            };
            let name = source.qualified_name();
            if inputs.iter().any(|input| input.name == name) {
                continue;
            }
            inputs.push(Dataset {
                namespace: self.config.root_namespace.clone(),
                name,
                facets: DatasetFacets {
                    schema: self.schema_facet(Vec::new()),
                    column_lineage: None,
                },
            });
        }

        inputs
    }

    fn schema_facet(&self, fields: Vec<SchemaField>) -> SchemaFacet {
        SchemaFacet {
            producer: self.config.producer.clone(),
            schema_url: SCHEMA_FACET_URL.to_string(),
            fields,
        }
    }

    fn column_lineage_facet(&self, schema_url: &str, fields: &ColumnLineageMap) -> ColumnLineageFacet {
        ColumnLineageFacet {
            producer: self.config.producer.clone(),
            schema_url: schema_url.to_string(),
            fields: fields.clone(),
        }
    }
}

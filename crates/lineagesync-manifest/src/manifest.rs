//! Compiled lineage manifest parsing
//!
//! The manifest is a JSON document with a `nodes` map (id -> node) and a
//! `lineage.edges` list of column-level dependencies. It is loaded once per
//! run and never mutated.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Source column value meaning "all columns of the source node"
pub const WILDCARD: &str = "*";

/// Compiled lineage manifest (subset of fields we care about)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// All nodes keyed by id, in document order
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: IndexMap<String, ManifestNode>,

    /// Column-level lineage
    #[serde(default, deserialize_with = "null_as_default")]
    pub lineage: Lineage,
}

impl Manifest {
    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse manifest from JSON string
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json)
            .map_err(|e| ManifestError::ParseError(e.to_string()))
    }

    /// Get a specific node by id
    pub fn get_node(&self, id: &str) -> Option<&ManifestNode> {
        self.nodes.get(id)
    }

    /// Qualified name of a node, or `..` if the id is dangling
    pub fn qualified_name(&self, id: &str) -> String {
        self.get_node(id)
            .map(ManifestNode::qualified_name)
            .unwrap_or_else(|| ManifestNode::default().qualified_name())
    }

    /// Model nodes in document order
    pub fn models(&self) -> impl Iterator<Item = (&str, &ManifestNode)> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.is_model())
            .map(|(id, node)| (id.as_str(), node))
    }

    /// All edges in document order
    pub fn edges(&self) -> &[LineageEdge] {
        &self.lineage.edges
    }

    /// Edges whose target is `node_id`, with or without a target column
    pub fn edges_into<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a LineageEdge> + 'a {
        self.lineage.edges.iter().filter(move |edge| edge.target == node_id)
    }

    /// Find a model id by its short name
    pub fn find_model(&self, name: &str) -> Option<&str> {
        self.models()
            .find(|(_, node)| node.name.as_deref() == Some(name))
            .map(|(id, _)| id)
    }
}

/// Node kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Raw input table, never a lineage target
    Source,

    /// Computed table or view
    Model,

    /// Anything else the manifest may contain (seeds, snapshots, ...)
    #[default]
    #[serde(other)]
    Other,
}

/// One table or view in the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestNode {
    #[serde(default)]
    pub node_type: NodeType,

    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub schema: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    /// Column metadata; order drives schema field emission order
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: IndexMap<String, ColumnMeta>,

    /// Direct upstream node ids, in declaration order
    #[serde(default, deserialize_with = "null_as_default")]
    pub depends_on: Vec<String>,

    /// Compiled SQL of the materialization
    #[serde(default)]
    pub compiled_code: Option<String>,
}

impl ManifestNode {
    /// `database.schema.name`, keeping empty segments
    pub fn qualified_name(&self) -> String {
        format!(
            "{}.{}.{}",
            self.database.as_deref().unwrap_or_default(),
            self.schema.as_deref().unwrap_or_default(),
            self.name.as_deref().unwrap_or_default(),
        )
    }

    pub fn is_model(&self) -> bool {
        self.node_type == NodeType::Model
    }

    pub fn is_source(&self) -> bool {
        self.node_type == NodeType::Source
    }

    /// Node name, or `unknown`
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unknown")
    }

    /// Compiled SQL, empty when absent
    pub fn compiled_sql(&self) -> &str {
        self.compiled_code.as_deref().unwrap_or_default()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }
}

/// Column metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMeta {
    #[serde(default)]
    pub data_type: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// `lineage` section of the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<LineageEdge>,
}

/// A manifest-declared dependency between two nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageEdge {
    pub source: String,

    pub target: String,

    /// Concrete column or `*`
    #[serde(default)]
    pub source_column: String,

    /// Absent for table-level edges
    #[serde(default)]
    pub target_column: Option<String>,
}

impl LineageEdge {
    /// Target column, treating an empty string as absent
    pub fn target_column(&self) -> Option<&str> {
        self.target_column.as_deref().filter(|c| !c.is_empty())
    }

    pub fn is_wildcard(&self) -> bool {
        self.source_column == WILDCARD
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Manifest parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),
}

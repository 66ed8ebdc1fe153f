//! Column lineage types
//!
//! These mirror the OpenLineage column-lineage facet: for each output column,
//! the input fields it was derived from and how it was derived.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a target column was produced from its inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformationType {
    /// Column is copied or renamed as-is
    #[default]
    Identity,

    /// Column is the result of an aggregate (SUM, COUNT, AVG, MIN, MAX)
    Aggregation,

    /// Column is produced by a CASE WHEN expression
    Conditional,

    /// Column is an arithmetic expression over a column and a literal
    Arithmetic,

    /// Column is a single-argument function call
    Function,
}

impl TransformationType {
    /// Stable label used in the emitted facet
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "IDENTITY",
            Self::Aggregation => "AGGREGATION",
            Self::Conditional => "CONDITIONAL",
            Self::Arithmetic => "ARITHMETIC",
            Self::Function => "FUNCTION",
        }
    }
}

impl std::fmt::Display for TransformationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single upstream field feeding a target column
///
/// Equality compares the whole triple, so the same field name coming from
/// two different datasets stays distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputField {
    /// Dataset namespace
    pub namespace: String,

    /// Qualified name of the source dataset (`database.schema.name`)
    pub name: String,

    /// Source column name
    pub field: String,
}

impl InputField {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            field: field.into(),
        }
    }
}

/// Lineage record for one target column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLineageEntry {
    /// Ordered, de-duplicated input fields
    pub input_fields: Vec<InputField>,

    /// Transformation classification
    pub transformation_type: TransformationType,
}

impl ColumnLineageEntry {
    /// Create an empty entry with the given transformation
    pub fn new(transformation_type: TransformationType) -> Self {
        Self {
            input_fields: Vec::new(),
            transformation_type,
        }
    }

    /// Append an input field unless an identical one is already present
    ///
    /// Returns `true` if the field was added.
    pub fn push_unique(&mut self, field: InputField) -> bool {
        if self.input_fields.contains(&field) {
            return false;
        }
        self.input_fields.push(field);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.input_fields.is_empty()
    }
}

/// Per-target-column lineage for one node, keyed by column name
///
/// Keys keep insertion order. An entry is only ever created together with its
/// first input field, so the map never holds a column with no inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnLineageMap {
    fields: IndexMap<String, ColumnLineageEntry>,
}

impl ColumnLineageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `field` as an input of `column`
    ///
    /// A new entry is created with `transformation` if the column has none yet;
    /// an existing entry keeps its transformation. Duplicate triples are ignored.
    pub fn add_input(
        &mut self,
        column: &str,
        field: InputField,
        transformation: TransformationType,
    ) -> bool {
        self.fields
            .entry(column.to_string())
            .or_insert_with(|| ColumnLineageEntry::new(transformation))
            .push_unique(field)
    }

    /// Insert a fully built entry
    ///
    /// Entries without input fields are dropped. Returns `true` if inserted.
    pub fn insert(&mut self, column: impl Into<String>, entry: ColumnLineageEntry) -> bool {
        if entry.is_empty() {
            return false;
        }
        self.fields.insert(column.into(), entry);
        true
    }

    pub fn get(&self, column: &str) -> Option<&ColumnLineageEntry> {
        self.fields.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ColumnLineageEntry)> {
        self.fields.iter()
    }

    /// Column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

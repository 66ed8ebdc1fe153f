//! Column lineage assembly for one target node
//!
//! Two passes:
//! 1. Explicit edges from the manifest, with `*` source columns resolved by
//!    SQL inference.
//! 2. Every declared column still without lineage is inferred from the
//!    compiled SQL and resolved against the node's `dependsOn` list.
//!
//! Nothing here fails: unresolved columns are omitted and reported as
//! warning diagnostics.

use lineagesync_core::{
    ColumnLineageEntry, ColumnLineageMap, Diagnostic, DiagnosticCode, InputField, TransformationType,
};
use lineagesync_manifest::{LineageEdge, Manifest, ManifestNode};
use lineagesync_sql::{classify_transformation, infer, Inference};
use std::collections::HashSet;

/// Lineage assembled for one node
#[derive(Debug, Clone, Default)]
pub struct AssembledLineage {
    /// Column lineage keyed by target column
    pub columns: ColumnLineageMap,

    /// One warning per unresolved column or wildcard
    pub diagnostics: Vec<Diagnostic>,
}

impl AssembledLineage {
    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len()
    }
}

/// Builds per-column lineage from a read-only manifest
#[derive(Debug, Clone)]
pub struct LineageAssembler<'a> {
    manifest: &'a Manifest,
    namespace: String,
}

impl<'a> LineageAssembler<'a> {
    /// `namespace` is stamped on every input field
    pub fn new(manifest: &'a Manifest, namespace: impl Into<String>) -> Self {
        Self {
            manifest,
            namespace: namespace.into(),
        }
    }

    /// Assemble the lineage map of `node_id`
    ///
    /// A dangling id is treated as a node with no columns, SQL or dependencies.
    pub fn assemble(&self, node_id: &str) -> AssembledLineage {
        let fallback = ManifestNode::default();
        let node = self.manifest.get_node(node_id).unwrap_or(&fallback);

        let mut lineage = AssembledLineage::default();
        let unresolved_wildcards = self.apply_explicit_edges(node_id, node, &mut lineage);
        self.infer_missing_columns(node_id, node, &unresolved_wildcards, &mut lineage);
        lineage
    }

    /// Pass 1: fold the explicit edges targeting `node_id` into `lineage`
    ///
    /// Idempotent: re-applying the same edges adds nothing. Returns the target
    /// columns whose wildcard edge could not be resolved.
    pub fn apply_explicit_edges(
        &self,
        node_id: &str,
        node: &ManifestNode,
        lineage: &mut AssembledLineage,
    ) -> HashSet<String> {
        let mut unresolved = HashSet::new();

        for edge in self.manifest.edges_into(node_id) {
            let Some(target_column) = edge.target_column() else {
                continue;
            };

            let source_name = self.manifest.qualified_name(&edge.source);

            for source_column in self.edge_source_columns(edge, target_column, node) {
                let field = InputField::new(&self.namespace, &source_name, source_column);
                lineage.columns.add_input(target_column, field, TransformationType::Identity);
            }

            if edge.is_wildcard() && !lineage.columns.contains(target_column) && unresolved.insert(target_column.to_string()) {
                tracing::warn!(
                    node = node_id,
                    column = target_column,
                    "Could not infer source column for wildcard dependency: {} <- {}.*",
                    target_column,
                    source_name
                );
                lineage.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::WildcardUnresolved,
                        format!(
                            "Could not infer source column for wildcard dependency: {} <- {}.*",
                            target_column, source_name
                        ),
                    )
                    .with_node(node_id)
                    .with_column(target_column),
                );
            }
        }

        unresolved
    }

    /// Concrete source columns of an edge; empty for an unresolvable wildcard
    fn edge_source_columns(&self, edge: &LineageEdge, target_column: &str, node: &ManifestNode) -> Vec<String> {
        if !edge.is_wildcard() {
            return vec![edge.source_column.clone()];
        }

        infer(target_column, node.compiled_sql())
            .source_columns()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Pass 2: infer lineage for declared columns that have none yet
    pub fn infer_missing_columns(
        &self,
        node_id: &str,
        node: &ManifestNode,
        skip: &HashSet<String>,
        lineage: &mut AssembledLineage,
    ) {
        let sql = node.compiled_sql();

        for column in node.columns.keys() {
            if lineage.columns.contains(column) || skip.contains(column) {
                continue;
            }

            let inference = infer(column, sql);
            if !inference.is_match() {
                tracing::warn!(
                    node = node_id,
                    column = column.as_str(),
                    "Could not infer source column for '{}' from SQL. Manual lineage definition may be required.",
                    column
                );
                lineage.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::ColumnUnresolved,
                        format!("Could not infer source column for '{}' from SQL", column),
                    )
                    .with_node(node_id)
                    .with_column(column.as_str()),
                );
                continue;
            }

            let entry = self.resolve_entry(node, column, &inference, sql);
            if !lineage.columns.insert(column.as_str(), entry) {
                let sources = inference.source_columns().join(", ");
                tracing::warn!(
                    node = node_id,
                    column = column.as_str(),
                    "No dependency of {} declares source column(s) [{}] for '{}'",
                    node_id,
                    sources,
                    column
                );
                lineage.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::SourceTableUnresolved,
                        format!(
                            "No dependency declares source column(s) [{}] for '{}'",
                            sources, column
                        ),
                    )
                    .with_node(node_id)
                    .with_column(column.as_str()),
                );
            }
        }
    }

    /// Build an entry from inferred identifiers, dropping those no dependency declares
    fn resolve_entry(
        &self,
        node: &ManifestNode,
        column: &str,
        inference: &Inference,
        sql: &str,
    ) -> ColumnLineageEntry {
        let mut entry = ColumnLineageEntry::new(classify_transformation(column, sql));

        for source_column in inference.source_columns() {
            if let Some(table) = self.resolve_source_table(node, source_column) {
                entry.push_unique(InputField::new(&self.namespace, table, source_column));
            }
        }

        entry
    }

    /// Qualified name of the first dependency, in `dependsOn` order, declaring `column`
    pub fn resolve_source_table(&self, node: &ManifestNode, column: &str) -> Option<String> {
        node.depends_on
            .iter()
            .filter_map(|dep_id| self.manifest.get_node(dep_id))
            .find(|dep| dep.has_column(column))
            .map(ManifestNode::qualified_name)
    }
}

//! Diagnostic codes for lineage sync runs
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the sync report.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// A `*` edge could not be resolved to a concrete source column
    WildcardUnresolved,

    /// No inference rule matched a column without an explicit edge
    ColumnUnresolved,

    /// Inferred source columns exist in none of the node's dependencies
    SourceTableUnresolved,

    /// The lineage sink rejected an event
    EmissionFailed,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WildcardUnresolved => "WILDCARD_UNRESOLVED",
            Self::ColumnUnresolved => "COLUMN_UNRESOLVED",
            Self::SourceTableUnresolved => "SOURCE_TABLE_UNRESOLVED",
            Self::EmissionFailed => "EMISSION_FAILED",
        }
    }

    /// Severity this code is reported with
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::EmissionFailed => Severity::Error,
            _ => Severity::Warn,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Lineage was dropped for a column but the run continued
    Warn,

    /// An event could not be delivered
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Manifest node the diagnostic refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,

    /// Target column, when the diagnostic is column-scoped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with the code's default severity
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            message: message.into(),
            node_id: None,
            column: None,
        }
    }

    /// Set the node
    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Set the target column
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

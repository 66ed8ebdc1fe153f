//! lineagesync core
//!
//! Core domain model with stable, versioned types.
//! Never rename diagnostic codes or transformation labels - they are part of
//! the emitted OpenLineage payloads and the sync report.

pub mod diagnostic;
pub mod lineage;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use lineage::{TransformationType, InputField, ColumnLineageEntry, ColumnLineageMap};
pub use report::{SyncReport, SyncSummary, ReportVersion};
pub use config::{SyncConfig, MarquezConfig, PathsConfig, OpenLineageConfig, LoggingConfig, ConfigError};

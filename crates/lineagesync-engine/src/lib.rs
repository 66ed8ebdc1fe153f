//! lineagesync engine - Core business logic
//!
//! This crate implements:
//! - Column lineage assembly (explicit edges merged with SQL inference)
//! - OpenLineage run event construction

pub mod assembler;
pub mod event;

pub use assembler::{LineageAssembler, AssembledLineage};
pub use event::{
    EventBuilder, BuiltEvent, RunEvent, EventType, Run, Job, JobFacets, Dataset, DatasetFacets,
    SchemaFacet, SchemaField, ColumnLineageFacet,
};

//! Lineage manifest parsing
//!
//! This crate handles:
//! - Parsing the compiled lineage manifest (nodes + column-level edges)
//! - Read-only, defaulting lookups of nodes by id
//! - Qualified dataset names (`database.schema.name`)

pub mod manifest;

pub use manifest::{Manifest, ManifestNode, NodeType, ColumnMeta, Lineage, LineageEdge, ManifestError, WILDCARD};

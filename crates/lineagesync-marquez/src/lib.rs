//! Lineage delivery to Marquez
//!
//! This crate provides:
//! - The [`LineageSink`] trait and its implementations ([`MarquezClient`],
//!   [`MockSink`], [`DryRunSink`])
//! - The [`SyncRunner`] that turns manifest models into delivered events
//! - Simplification of Marquez lineage graph responses
//!
//! ## Example
//!
//! ```rust,ignore
//! use lineagesync_marquez::{MarquezClient, SyncRunner};
//!
//! let client = MarquezClient::from_config(&config);
//! let report = SyncRunner::new(&manifest, config.openlineage.clone(), &client)
//!     .run(None)
//!     .await;
//! ```

pub mod sink;
pub mod marquez;
pub mod mock;
pub mod dry_run;
pub mod sync;
pub mod simplify;

pub use sink::{LineageSink, SinkError, DatasetId, DatasetRequest, DatasetField};
pub use marquez::MarquezClient;
pub use mock::MockSink;
pub use dry_run::DryRunSink;
pub use sync::SyncRunner;
pub use simplify::{
    simplify_lineage, simplify_str, fetch_lineage, LineageGraph, SimplifiedLineage, SimplifyError,
    SimplifyStats,
};

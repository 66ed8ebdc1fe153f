//! Pattern-based column inference over compiled SQL
//!
//! This crate handles:
//! - Whitespace normalization of compiled SQL
//! - The ordered rule cascade mapping a target column to its source column(s)
//! - Transformation classification of a target column
//!
//! No SQL parser is involved: every failure is "no rule matched", never an error.

pub mod normalize;
pub mod rules;
pub mod inference;
pub mod classifier;

pub use normalize::normalize_sql;
pub use rules::Rule;
pub use inference::{infer, infer_column, Inference, InferredColumn};
pub use classifier::classify_transformation;

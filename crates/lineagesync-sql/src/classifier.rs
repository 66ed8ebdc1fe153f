//! Transformation classification
//!
//! Independent of which inference rule fired: the probes below are evaluated
//! on their own against the normalized SQL, in this order, and the first hit
//! decides the label.

use crate::normalize::normalize_sql;
use lineagesync_core::TransformationType;
use regex::Regex;

fn probes(target: &str) -> [(TransformationType, String); 4] {
    let target = regex::escape(target);
    [
        (
            TransformationType::Aggregation,
            format!(r"(?i)\b(sum|count|avg|min|max)\s*\(.*?\)\s+as\s+{target}\b"),
        ),
        (
            TransformationType::Conditional,
            format!(r"(?is)case\s+when.*?as\s+{target}\b"),
        ),
        (
            TransformationType::Arithmetic,
            format!(r"(?i)\w+\s*[+\-*/]\s*\d+\s+as\s+{target}\b"),
        ),
        (
            TransformationType::Function,
            format!(r"(?i)\w+\(\w+\)\s+as\s+{target}\b"),
        ),
    ]
}

/// Classify how `target` is produced by `sql`, defaulting to `IDENTITY`
pub fn classify_transformation(target: &str, sql: &str) -> TransformationType {
    let normalized = normalize_sql(sql);
    if normalized.is_empty() || target.is_empty() {
        return TransformationType::Identity;
    }

    probes(target)
        .into_iter()
        .find(|(_, pattern)| {
            Regex::new(pattern)
                .map(|regex| regex.is_match(&normalized))
                .unwrap_or(false)
        })
        .map(|(label, _)| label)
        .unwrap_or_default()
}

//! Column inference engine
//!
//! Maps `(target column, compiled SQL)` to the source column(s) the target is
//! derived from. Deterministic, stateless, and infallible: missing SQL or SQL
//! that no rule understands yields [`Inference::NoMatch`].

use crate::normalize::normalize_sql;
use crate::rules::Rule;
use lineagesync_core::TransformationType;

/// Outcome of running the rule cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inference {
    /// No rule matched
    NoMatch,

    /// One of the single-column rules matched
    SingleColumn { column: String, rule: Rule },

    /// The conditional-sum rule matched
    MultiColumn { columns: Vec<String>, rule: Rule },
}

impl Inference {
    pub fn is_match(&self) -> bool {
        !matches!(self, Self::NoMatch)
    }

    /// Rule that produced the result
    pub fn rule(&self) -> Option<Rule> {
        match self {
            Self::NoMatch => None,
            Self::SingleColumn { rule, .. } | Self::MultiColumn { rule, .. } => Some(*rule),
        }
    }

    /// Extracted source columns, in capture order
    pub fn source_columns(&self) -> Vec<&str> {
        match self {
            Self::NoMatch => Vec::new(),
            Self::SingleColumn { column, .. } => vec![column.as_str()],
            Self::MultiColumn { columns, .. } => columns.iter().map(String::as_str).collect(),
        }
    }

    /// Flatten into the public result shape
    pub fn into_inferred(self) -> Option<InferredColumn> {
        match self {
            Self::NoMatch => None,
            Self::SingleColumn { column, rule } => Some(InferredColumn {
                source_columns: vec![column],
                transformation_type: rule.transformation(),
            }),
            Self::MultiColumn { columns, rule } => Some(InferredColumn {
                source_columns: columns,
                transformation_type: rule.transformation(),
            }),
        }
    }
}

/// Source columns and transformation inferred for one target column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredColumn {
    pub source_columns: Vec<String>,
    pub transformation_type: TransformationType,
}

/// Run the rule cascade for `target` over `sql`
pub fn infer(target: &str, sql: &str) -> Inference {
    let normalized = normalize_sql(sql);
    if normalized.is_empty() || target.is_empty() {
        return Inference::NoMatch;
    }

    for rule in Rule::ORDER {
        let Some(mut columns) = rule.apply(target, &normalized) else {
            continue;
        };

        tracing::trace!(column = target, rule = ?rule, columns = ?columns, "Inference rule matched");

        return if rule.is_multi_column() {
            Inference::MultiColumn { columns, rule }
        } else {
            Inference::SingleColumn {
                column: columns.swap_remove(0),
                rule,
            }
        };
    }

    Inference::NoMatch
}

/// Infer the source columns and transformation of `target`
pub fn infer_column(target: &str, sql: &str) -> Option<InferredColumn> {
    infer(target, sql).into_inferred()
}

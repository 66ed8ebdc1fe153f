//! The ordered rule cascade
//!
//! Each rule is a regex anchored on `... AS <target>` (or a bare mention of the
//! target) plus an extractor over its capture groups. Rules are tried in
//! [`Rule::ORDER`] and the first one that yields a column wins.

use lineagesync_core::TransformationType;
use regex::{Captures, Regex};

/// Words that `\w+` can capture but that never name a source column
const KEYWORDS: &[&str] = &[
    "and", "case", "distinct", "else", "end", "false", "not", "null", "or", "then", "true", "when",
];

/// One inference rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// `SUM(CASE WHEN <cond> = ... THEN <value> ... END) AS <target>`
    SumCase,

    /// `<column> AS <target>`
    DirectAlias,

    /// `<func>(<column>) AS <target>`
    FunctionCall,

    /// `<column> <op> <number> AS <target>`
    Arithmetic,

    /// `CASE WHEN <cond> = ... THEN <value> ... AS <target>`
    ///
    /// Only the condition column is returned; the THEN-branch column is not.
    CaseWhen,

    /// The target name appears anywhere as a whole word
    VerbatimMention,
}

impl Rule {
    /// Priority order, most specific first
    pub const ORDER: [Rule; 6] = [
        Rule::SumCase,
        Rule::DirectAlias,
        Rule::FunctionCall,
        Rule::Arithmetic,
        Rule::CaseWhen,
        Rule::VerbatimMention,
    ];

    /// Transformation implied by this rule
    pub fn transformation(&self) -> TransformationType {
        match self {
            Self::SumCase => TransformationType::Aggregation,
            Self::DirectAlias | Self::VerbatimMention => TransformationType::Identity,
            Self::FunctionCall => TransformationType::Function,
            Self::Arithmetic => TransformationType::Arithmetic,
            Self::CaseWhen => TransformationType::Conditional,
        }
    }

    /// Whether the rule can yield more than one source column
    pub fn is_multi_column(&self) -> bool {
        matches!(self, Self::SumCase)
    }

    /// Regex source for `target`, case-insensitive
    pub fn pattern(&self, target: &str) -> String {
        let target = regex::escape(target);
        match self {
            Self::SumCase => format!(
                r"(?is)sum\s*\(\s*case\s+when\s+(\w+)\s*=.*?then\s+(\w+).*?\)\s+as\s+{target}\b"
            ),
            Self::DirectAlias => format!(r"(?i)(\w+)\s+as\s+{target}\b"),
            Self::FunctionCall => format!(r"(?i)\w+\((\w+)\)\s+as\s+{target}\b"),
            Self::Arithmetic => format!(r"(?i)(\w+)\s*[+\-*/]\s*\d+\s+as\s+{target}\b"),
            Self::CaseWhen => format!(
                r"(?is)case\s+when\s+(\w+)\s*=.*?then\s+(\w+).*?as\s+{target}\b"
            ),
            Self::VerbatimMention => format!(r"(?i)\b{target}\b"),
        }
    }

    /// Compile the rule for `target`
    ///
    /// Returns `None` if the pattern cannot be built; the rule is then skipped.
    pub fn compile(&self, target: &str) -> Option<Regex> {
        match Regex::new(&self.pattern(target)) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::debug!(rule = ?self, column = target, error = %e, "Skipping rule with invalid pattern");
                None
            }
        }
    }

    /// Apply the rule to normalized SQL
    ///
    /// Returns the extracted source columns, or `None` if the rule does not
    /// match or only captured literals/keywords.
    pub fn apply(&self, target: &str, normalized_sql: &str) -> Option<Vec<String>> {
        let regex = self.compile(target)?;
        let captures = regex.captures(normalized_sql)?;
        let columns = self.extract(target, &captures);
        (!columns.is_empty()).then_some(columns)
    }

    fn extract(&self, target: &str, captures: &Captures<'_>) -> Vec<String> {
        let groups: &[usize] = match self {
            Self::SumCase => &[1, 2],
            Self::DirectAlias | Self::FunctionCall | Self::Arithmetic | Self::CaseWhen => &[1],
            Self::VerbatimMention => return vec![target.to_string()],
        };

        let mut columns: Vec<String> = Vec::with_capacity(groups.len());
        for &group in groups {
            if let Some(m) = captures.get(group) {
                let column = m.as_str();
                if is_column_name(column) && !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
        }
        columns
    }
}

/// `\w+` captures that can plausibly name a column
fn is_column_name(word: &str) -> bool {
    let starts_with_digit = word.chars().next().map_or(true, |c| c.is_ascii_digit());
    !starts_with_digit && !KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cols(columns: &[&str]) -> Option<Vec<String>> {
        Some(columns.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn sum_case_returns_condition_and_value() {
        let sql = "SELECT SUM(CASE WHEN status = 'paid' THEN amount ELSE 0 END) AS paid_total FROM orders";
        assert_eq!(Rule::SumCase.apply("paid_total", sql), cols(&["status", "amount"]));
    }

    #[test]
    fn sum_case_drops_literal_value() {
        let sql = "SELECT SUM(CASE WHEN status = 'paid' THEN 1 ELSE 0 END) AS paid_count FROM orders";
        assert_eq!(Rule::SumCase.apply("paid_count", sql), cols(&["status"]));
    }

    #[test]
    fn direct_alias() {
        let sql = "SELECT customer_id AS cust_id FROM raw_customers";
        assert_eq!(Rule::DirectAlias.apply("cust_id", sql), cols(&["customer_id"]));
    }

    #[test]
    fn direct_alias_is_case_insensitive() {
        let sql = "select Customer_ID as CUST_ID from raw";
        assert_eq!(Rule::DirectAlias.apply("cust_id", sql), cols(&["Customer_ID"]));
    }

    #[test]
    fn direct_alias_ignores_function_wrapper() {
        let sql = "SELECT SUM(amount) AS total_amount FROM orders";
        assert_eq!(Rule::DirectAlias.apply("total_amount", sql), None);
    }

    #[test]
    fn direct_alias_rejects_keywords_and_literals() {
        let case_sql = "SELECT CASE WHEN a = 1 THEN b END AS flag FROM t";
        assert_eq!(Rule::DirectAlias.apply("flag", case_sql), None);

        let literal_sql = "SELECT amount / 100 AS amount_dollars FROM t";
        assert_eq!(Rule::DirectAlias.apply("amount_dollars", literal_sql), None);
    }

    #[test]
    fn direct_alias_respects_word_boundary() {
        let sql = "SELECT a AS cust_id_hash FROM t";
        assert_eq!(Rule::DirectAlias.apply("cust_id", sql), None);
    }

    #[test]
    fn function_call() {
        let sql = "SELECT UPPER(email) AS email_upper FROM users";
        assert_eq!(Rule::FunctionCall.apply("email_upper", sql), cols(&["email"]));
    }

    #[test]
    fn arithmetic() {
        let sql = "SELECT amount / 100 AS amount_dollars FROM orders";
        assert_eq!(Rule::Arithmetic.apply("amount_dollars", sql), cols(&["amount"]));
    }

    #[test]
    fn case_when_returns_condition_only() {
        let sql = "SELECT CASE WHEN status = 'vip' THEN discount ELSE 0 END AS vip_discount FROM c";
        assert_eq!(Rule::CaseWhen.apply("vip_discount", sql), cols(&["status"]));
    }

    #[test]
    fn verbatim_mention_returns_target() {
        let sql = "SELECT legacy_flag FROM accounts";
        assert_eq!(Rule::VerbatimMention.apply("legacy_flag", sql), cols(&["legacy_flag"]));
        assert_eq!(Rule::VerbatimMention.apply("legacy", sql), None);
    }

    #[test]
    fn target_is_escaped() {
        let sql = "SELECT a AS b FROM t";
        assert_eq!(Rule::DirectAlias.apply("b(", sql), None);
        assert_eq!(Rule::VerbatimMention.apply("[", sql), None);
    }

    #[test]
    fn labels() {
        assert_eq!(Rule::SumCase.transformation(), TransformationType::Aggregation);
        assert_eq!(Rule::CaseWhen.transformation(), TransformationType::Conditional);
        assert_eq!(Rule::VerbatimMention.transformation(), TransformationType::Identity);
        assert!(Rule::SumCase.is_multi_column());
        assert!(!Rule::DirectAlias.is_multi_column());
    }
}

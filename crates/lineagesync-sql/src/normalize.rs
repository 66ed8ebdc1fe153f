//! SQL text normalization

/// Collapse every whitespace run (newlines included) to a single space and trim
///
/// Compiled SQL is routinely reflowed across lines; all matching runs on the
/// normalized text so `<expr> AS <column>` survives arbitrary wrapping.
pub fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! FTS5 keyword search helpers.

/// Quotes every token so SQLite's FTS5 query parser treats the caller's
/// query as a list of literal terms instead of FTS5 query syntax
/// (column filters, `NOT`, `NEAR`, unbalanced quotes, ...).
pub fn sanitize_fts5_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" ")
}

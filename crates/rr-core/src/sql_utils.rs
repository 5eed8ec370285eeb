//! SQL identifier utilities
//!
//! Criteria keys, sort fields and configured table names all end up inside
//! generated SQL, so they are checked against a strict identifier grammar
//! before use and quoted on output.

/// Quote a SQL identifier.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use rr_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("users"), r#""users""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `schema.table`).
///
/// # Examples
/// ```
/// use rr_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("staging.orders"), r#""staging"."orders""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Check that `ident` is a plain identifier: a letter or underscore followed
/// by letters, digits or underscores.
///
/// # Examples
/// ```
/// use rr_core::sql_utils::is_valid_ident;
/// assert!(is_valid_ident("first_name"));
/// assert!(!is_valid_ident("name; DROP TABLE users"));
/// ```
pub fn is_valid_ident(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a field path into `(qualifier, field)`.
///
/// `team.name` yields `(Some("team"), "name")`, `name` yields `(None, "name")`.
/// Only the first `.` separates; the remainder is the field.
pub fn split_path(path: &str) -> (Option<&str>, &str) {
    match path.find('.') {
        Some(pos) => (Some(&path[..pos]), &path[pos + 1..]),
        None => (None, path),
    }
}

/// Escape a SQL string literal value by doubling single quotes.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
#[path = "sql_utils_test.rs"]
mod tests;

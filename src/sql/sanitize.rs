//! SQL Identifier Sanitization Utilities
//!
//! Identifiers (table and column names) are interpolated into SQL text, so
//! they are validated against a strict pattern and always quoted.

use std::sync::LazyLock;

use regex::Regex;

// SQLite treats every non-ASCII character as an identifier character.
static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_]|[^\x00-\x7F])(?:[A-Za-z0-9_]|[^\x00-\x7F])*$")
        .expect("identifier pattern compiles")
});

/// Quote a SQL identifier to make it safe for use in queries
///
/// # Example
/// ```
/// use runtara_table_gateway::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("users"), "\"users\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Validate a table, column or key field name
///
/// Rules:
/// - Must start with an ASCII letter, an underscore or a non-ASCII character
/// - Can only contain ASCII letters, digits, underscores and non-ASCII characters
///
/// These are also the names SQLite accepts after `:` in a named parameter,
/// so every valid identifier can be bound as `:<name>`.
///
/// # Example
/// ```
/// use runtara_table_gateway::sql::validate_identifier;
///
/// assert!(validate_identifier("users").is_ok());
/// assert!(validate_identifier("users; DROP TABLE users").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if !IDENTIFIER_RE.is_match(name) {
        return Err(format!(
            "Identifier '{}' is invalid. Must start with a letter or underscore \
             and contain only letters, numbers, and underscores.",
            name
        ));
    }

    Ok(())
}

/// Named parameter for a column, e.g. `:email`
pub fn parameter_name(column: &str) -> String {
    format!(":{}", column)
}

//! Column projection against the whitelist

use tracing::debug;

use crate::schema::Schema;

/// Keep the requested columns that may receive a value in INSERT/UPDATE.
///
/// Order is preserved; unknown columns, the key field and repeats are dropped.
pub fn project_writable<'a, I>(requested: I, schema: &Schema, key_field: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    project(requested, |column| schema.is_writable(column, key_field))
}

/// Keep the requested columns that may appear in a SELECT list.
///
/// The key field is allowed; unknown columns and repeats are dropped.
pub fn project_readable<'a, I>(requested: I, schema: &Schema) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    project(requested, |column| schema.is_allowed(column))
}

fn project<'a, I, F>(requested: I, keep: F) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> bool,
{
    let mut projected: Vec<String> = Vec::new();
    for column in requested {
        if !keep(column) {
            debug!(column = %column, "Dropping column outside the whitelist");
            continue;
        }
        if projected.iter().any(|c| c == column) {
            continue;
        }
        projected.push(column.to_string());
    }
    projected
}

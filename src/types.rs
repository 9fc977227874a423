//! Core type definitions for the table gateway
//!
//! Includes the row representation, SQLite type affinity, and the
//! conversions between JSON values and SQLite values.

use rusqlite::types::{Value as SqlValue, ValueRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A single result row: column name → value, in result-column order
pub type Row = Map<String, Value>;

/// Outcome of an INSERT, UPDATE or DELETE, passed through from the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    /// Number of rows inserted, changed or removed
    #[serde(rename = "rowsAffected")]
    pub rows_affected: usize,
    /// Rowid of the most recent successful insert on the connection
    #[serde(rename = "lastInsertId")]
    pub last_insert_id: i64,
}

// ============================================================================
// Column affinity
// ============================================================================

/// SQLite type affinity derived from a column's declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnAffinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl ColumnAffinity {
    /// Apply SQLite's affinity rules to a declared type name.
    ///
    /// Rules are checked in order: `INT` → INTEGER; `CHAR`, `CLOB` or `TEXT`
    /// → TEXT; `BLOB` or no type → BLOB; `REAL`, `FLOA` or `DOUB` → REAL;
    /// anything else → NUMERIC.
    pub fn from_declared_type(declared: &str) -> Self {
        let upper = declared.to_uppercase();
        if upper.contains("INT") {
            ColumnAffinity::Integer
        } else if ["CHAR", "CLOB", "TEXT"].iter().any(|t| upper.contains(t)) {
            ColumnAffinity::Text
        } else if upper.contains("BLOB") || upper.trim().is_empty() {
            ColumnAffinity::Blob
        } else if ["REAL", "FLOA", "DOUB"].iter().any(|t| upper.contains(t)) {
            ColumnAffinity::Real
        } else {
            ColumnAffinity::Numeric
        }
    }

    /// Coerce a JSON value into the shape this column stores.
    ///
    /// Numeric strings become numbers for numeric affinities (common when
    /// values come from forms or CSV), booleans become 0/1, and arrays or
    /// objects become their JSON text. Anything else is returned unchanged.
    pub fn coerce(&self, value: &Value) -> Value {
        match (self, value) {
            (_, Value::Array(_) | Value::Object(_)) => Value::String(value.to_string()),
            (ColumnAffinity::Text, _) | (ColumnAffinity::Blob, _) => value.clone(),
            (_, Value::Bool(b)) => Value::from(i64::from(*b)),
            (ColumnAffinity::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| value.clone()),
            (ColumnAffinity::Real, Value::String(s)) => {
                parse_real(s).unwrap_or_else(|| value.clone())
            }
            (ColumnAffinity::Numeric, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .ok()
                .map(Value::from)
                .or_else(|| parse_real(s))
                .unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        }
    }
}

fn parse_real(s: &str) -> Option<Value> {
    s.trim()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

// ============================================================================
// JSON <-> SQLite conversions
// ============================================================================

/// Convert a JSON value into a SQLite value for binding
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::Real(f)
            } else {
                SqlValue::Text(n.to_string())
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Convert a SQLite column value into JSON
pub fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Array(b.iter().map(|byte| Value::from(*byte)).collect()),
    }
}

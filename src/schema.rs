//! Column whitelist built from schema introspection
//!
//! A [`Schema`] is populated once, when the gateway is constructed, from
//! SQLite's `PRAGMA table_info`. Every identifier the gateway interpolates
//! into SQL text is checked against it first.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{GatewayError, Result};
use crate::sql::sanitize::{quote_identifier, validate_identifier};
use crate::store::Store;
use crate::types::{ColumnAffinity, Row};

/// One column as reported by the table metadata query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared SQL type, exactly as written in the table definition (may be empty)
    #[serde(rename = "declaredType")]
    pub declared_type: String,
    /// Affinity SQLite applies to stored values
    pub affinity: ColumnAffinity,
    /// Whether the column was declared NOT NULL
    #[serde(rename = "notNull")]
    pub not_null: bool,
    /// Default value expression, as text
    #[serde(rename = "defaultValue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Whether the column is part of the primary key
    #[serde(rename = "primaryKey")]
    pub primary_key: bool,
}

impl ColumnInfo {
    /// Create a nullable, non-key column with the given declared type
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        let declared_type = declared_type.into();
        Self {
            name: name.into(),
            affinity: ColumnAffinity::from_declared_type(&declared_type),
            declared_type,
            not_null: false,
            default_value: None,
            primary_key: false,
        }
    }

    /// Mark as primary key
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    fn from_pragma_row(row: &Row) -> std::result::Result<Self, String> {
        let name = row
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| "column descriptor has no name".to_string())?;
        let declared_type = row.get("type").and_then(Value::as_str).unwrap_or_default();

        let mut column = ColumnInfo::new(name, declared_type);
        column.not_null = row.get("notnull").and_then(Value::as_i64).unwrap_or(0) != 0;
        column.primary_key = row.get("pk").and_then(Value::as_i64).unwrap_or(0) != 0;
        column.default_value = match row.get("dflt_value") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        Ok(column)
    }
}

/// Whitelist of the columns of one table: name → declared type
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    table: String,
    columns: Vec<ColumnInfo>,
    by_name: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema from already-known columns
    ///
    /// Columns whose names cannot be used as a named parameter are skipped.
    pub fn from_columns(table: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        let table = table.into();
        let mut kept = Vec::with_capacity(columns.len());
        let mut by_name = HashMap::with_capacity(columns.len());

        for column in columns {
            if let Err(reason) = validate_identifier(&column.name) {
                warn!(
                    table = %table,
                    column = %column.name,
                    %reason,
                    "Skipping column that cannot be bound by name"
                );
                continue;
            }
            if by_name.contains_key(&column.name) {
                continue;
            }
            by_name.insert(column.name.clone(), kept.len());
            kept.push(column);
        }

        Self {
            table,
            columns: kept,
            by_name,
        }
    }

    /// Discover the columns of `table` through the store's metadata query
    ///
    /// Fails with [`GatewayError::Schema`] when the table name is not a valid
    /// identifier, the metadata query fails, or the table does not exist.
    #[instrument(skip_all, fields(table = %table))]
    pub fn introspect<S: Store + ?Sized>(store: &S, table: &str) -> Result<Self> {
        validate_identifier(table).map_err(|reason| GatewayError::schema(table, reason))?;

        let sql = format!("PRAGMA table_info({})", quote_identifier(table));
        let rows = store
            .query(&sql)
            .map_err(|e| GatewayError::introspection(table, e))?;

        if rows.is_empty() {
            return Err(GatewayError::schema(table, "table does not exist"));
        }

        let columns = rows
            .iter()
            .map(ColumnInfo::from_pragma_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|reason| GatewayError::schema(table, reason))?;

        let schema = Self::from_columns(table, columns);
        debug!(columns = schema.len(), "Introspected table schema");
        Ok(schema)
    }

    /// Table this schema describes
    pub fn table(&self) -> &str {
        &self.table
    }

    /// True iff `column` exists in the table
    pub fn is_allowed(&self, column: &str) -> bool {
        self.by_name.contains_key(column)
    }

    /// True iff `column` exists and is not the key field
    pub fn is_writable(&self, column: &str, key_field: &str) -> bool {
        self.is_allowed(column) && column != key_field
    }

    /// Declared SQL type of `column`
    pub fn declared_type(&self, column: &str) -> Option<&str> {
        self.column(column).map(|c| c.declared_type.as_str())
    }

    /// Full metadata of `column`
    pub fn column(&self, column: &str) -> Option<&ColumnInfo> {
        self.by_name.get(column).map(|&i| &self.columns[i])
    }

    /// All columns, in table order
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Column names, in table order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Columns that make up the primary key, in table order
    pub fn primary_key(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
    }

    /// Coerce `value` by the affinity of `column`; unknown columns pass through
    pub fn coerce(&self, column: &str, value: &Value) -> Value {
        match self.column(column) {
            Some(info) => info.affinity.coerce(value),
            None => value.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

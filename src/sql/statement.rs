//! Statement generation
//!
//! [`StatementFactory`] composes the whitelist, condition builder and
//! projector into complete SQL text plus the named bindings it needs.
//! Identifiers are quoted into the text; values only ever travel as bindings.

use serde_json::{Map, Value};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::schema::Schema;
use crate::sql::condition::build_equality;
use crate::sql::projection::{project_readable, project_writable};
use crate::sql::sanitize::{parameter_name, quote_identifier};

/// Parameter the row identifier is bound to in UPDATE and DELETE
pub const KEY_PARAMETER: &str = ":id";

/// A named parameter and the value bound to it
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Parameter name, including the `:` prefix
    pub name: String,
    /// Column the value is compared with or written to
    pub column: String,
    pub value: Value,
}

impl Binding {
    pub fn new(name: impl Into<String>, column: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            value,
        }
    }
}

/// Why a generated statement will not prepare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defect {
    /// A WHERE clause was required but no condition survived the whitelist
    EmptyConditions,
    /// No column survived the whitelist
    EmptyProjection,
}

/// SQL text and its ordered bindings
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub bindings: Vec<Binding>,
    /// Set when the text is known to be malformed
    pub defect: Option<Defect>,
}

impl Statement {
    fn new(sql: String, bindings: Vec<Binding>) -> Self {
        Self {
            sql,
            bindings,
            defect: None,
        }
    }

    fn with_defect(mut self, defect: Defect) -> Self {
        self.defect = Some(defect);
        self
    }

    /// Classify a preparation failure reported by the store
    pub fn prepare_failed(&self, source: GatewayError) -> GatewayError {
        match self.defect {
            Some(Defect::EmptyConditions) => GatewayError::MalformedQuery {
                sql: self.sql.clone(),
                source: Box::new(source),
            },
            Some(Defect::EmptyProjection) => GatewayError::EmptyProjection {
                sql: self.sql.clone(),
                source: Box::new(source),
            },
            None => source,
        }
    }
}

/// Builds statements for one table from its schema and configuration
pub struct StatementFactory<'a> {
    schema: &'a Schema,
    config: &'a GatewayConfig,
}

impl<'a> StatementFactory<'a> {
    pub fn new(schema: &'a Schema, config: &'a GatewayConfig) -> Self {
        Self { schema, config }
    }

    /// `SELECT * FROM <table> [ORDER BY <order>]`
    pub fn select_all(&self) -> Statement {
        let sql = format!("SELECT * FROM {}", self.table());
        Statement::new(self.with_order(sql), Vec::new())
    }

    /// `SELECT * FROM <table> WHERE (<conditions>) [ORDER BY <order>]`
    pub fn select_where(&self, conditions: &Map<String, Value>) -> Statement {
        let set = build_equality(conditions, self.schema);
        let sql = format!(
            "SELECT * FROM {} WHERE {}",
            self.table(),
            set.join(self.config.separator)
        );
        let empty = set.is_empty();
        let statement = Statement::new(self.with_order(sql), set.into_bindings());
        if empty {
            statement.with_defect(Defect::EmptyConditions)
        } else {
            statement
        }
    }

    /// `SELECT <columns> FROM <table> [WHERE (<conditions>)] [ORDER BY <order>]`
    pub fn select_subset_where<'c, I>(
        &self,
        columns: I,
        conditions: &Map<String, Value>,
    ) -> Statement
    where
        I: IntoIterator<Item = &'c str>,
    {
        let projected = project_readable(columns, self.schema);
        let set = build_equality(conditions, self.schema);

        let mut sql = format!("SELECT {} FROM {}", quote_list(&projected), self.table());
        if !set.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&set.join(self.config.separator));
        }

        let statement = Statement::new(self.with_order(sql), set.into_bindings());
        if projected.is_empty() {
            statement.with_defect(Defect::EmptyProjection)
        } else {
            statement
        }
    }

    /// `INSERT INTO <table> (<columns>) VALUES (:<c1>, :<c2>, ...)`
    pub fn insert(&self, data: &Map<String, Value>) -> Statement {
        let projected = self.writable(data);
        let placeholders: Vec<String> = projected.iter().map(|c| parameter_name(c)).collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table(),
            quote_list(&projected),
            placeholders.join(", ")
        );

        let statement = Statement::new(sql, self.bindings_for(&projected, data));
        if projected.is_empty() {
            statement.with_defect(Defect::EmptyProjection)
        } else {
            statement
        }
    }

    /// `UPDATE <table> SET <c1> = :<c1>, ... WHERE <key> = :id`
    pub fn update(&self, data: &Map<String, Value>, id: &Value) -> Statement {
        let projected = self.writable(data);
        let key_param = self.key_parameter(&projected);

        let assignments: Vec<String> = projected
            .iter()
            .map(|c| format!("{} = {}", quote_identifier(c), parameter_name(c)))
            .collect();

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.table(),
            assignments.join(", "),
            quote_identifier(&self.config.key_field),
            key_param
        );

        let mut bindings = self.bindings_for(&projected, data);
        bindings.push(self.key_binding(key_param, id));

        let statement = Statement::new(sql, bindings);
        if projected.is_empty() {
            statement.with_defect(Defect::EmptyProjection)
        } else {
            statement
        }
    }

    /// `DELETE FROM <table> WHERE (<key> = :id)`
    pub fn delete(&self, id: &Value) -> Statement {
        let sql = format!(
            "DELETE FROM {} WHERE ({} = {})",
            self.table(),
            quote_identifier(&self.config.key_field),
            KEY_PARAMETER
        );
        Statement::new(sql, vec![self.key_binding(KEY_PARAMETER.to_string(), id)])
    }

    fn table(&self) -> String {
        quote_identifier(self.schema.table())
    }

    fn with_order(&self, mut sql: String) -> String {
        if let Some(order) = self.config.order.as_deref().map(str::trim) {
            if !order.is_empty() {
                sql.push_str(" ORDER BY ");
                sql.push_str(order);
            }
        }
        sql
    }

    fn writable(&self, data: &Map<String, Value>) -> Vec<String> {
        project_writable(
            data.keys().map(String::as_str),
            self.schema,
            &self.config.key_field,
        )
    }

    fn bindings_for(&self, columns: &[String], data: &Map<String, Value>) -> Vec<Binding> {
        columns
            .iter()
            .map(|c| {
                let value = data.get(c).unwrap_or(&Value::Null);
                Binding::new(parameter_name(c), c, self.schema.coerce(c, value))
            })
            .collect()
    }

    fn key_binding(&self, name: String, id: &Value) -> Binding {
        let key = &self.config.key_field;
        Binding::new(name, key, self.schema.coerce(key, id))
    }

    /// `:id`, unless a written column already uses that parameter
    fn key_parameter(&self, written: &[String]) -> String {
        let mut param = KEY_PARAMETER.to_string();
        while written.iter().any(|c| parameter_name(c) == param) {
            param.insert(1, '_');
        }
        param
    }
}

fn quote_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ")
}

//! Store - the boundary between the query builder and the embedded database
//!
//! The gateway never talks to SQLite directly. It holds a [`Store`], which
//! offers the two primitives it needs: running unparameterized SQL
//! ([`Store::query`]) and preparing a statement for named-parameter binding
//! ([`Store::prepare`]). [`SqliteStore`] implements them over `rusqlite`;
//! tests can substitute their own implementation.

use std::path::Path;

use rusqlite::{Connection, Rows};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{GatewayError, Result};
use crate::types::{Row, WriteResult, from_sql_value, to_sql_value};

/// What a prepared statement produced when executed
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    /// The statement has result columns; every row, fully drained
    Rows(Vec<Row>),
    /// The statement wrote to the table
    Completed(WriteResult),
}

impl Execution {
    /// Rows produced by the statement (empty for writes)
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Execution::Rows(rows) => rows,
            Execution::Completed(_) => Vec::new(),
        }
    }

    /// Write outcome; a statement that produced a result set is an error
    pub fn into_write_result(self) -> Result<WriteResult> {
        match self {
            Execution::Completed(result) => Ok(result),
            Execution::Rows(_) => Err(GatewayError::store(
                "write statement produced a result set",
            )),
        }
    }
}

/// A compiled statement awaiting parameter values
pub trait PreparedStatement {
    /// Bind `value` to the named parameter `name` (including its `:` prefix)
    fn bind(&mut self, name: &str, value: &Value) -> Result<()>;

    /// Run the statement with the current bindings
    fn execute(&mut self) -> Result<Execution>;
}

/// Primitives the gateway needs from the embedded database
pub trait Store {
    /// Run SQL without parameters and drain every row
    fn query(&self, sql: &str) -> Result<Vec<Row>>;

    /// Compile SQL for later binding and execution
    fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedStatement + '_>>;
}

impl<S: Store + ?Sized> Store for &S {
    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        (**self).query(sql)
    }

    fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedStatement + '_>> {
        (**self).prepare(sql)
    }
}

// ============================================================================
// SQLite
// ============================================================================

/// A [`Store`] backed by a single SQLite connection
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at the given path
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!("Opened SQLite store");
        Ok(Self { conn })
    }

    /// Open an in-memory SQLite database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("Opened in-memory SQLite store");
        Ok(Self { conn })
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run one or more semicolon-separated statements without parameters
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql)?;
        let names = column_names(&stmt);
        let rows = stmt.query([])?;
        drain_rows(&names, rows)
    }

    fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedStatement + '_>> {
        let stmt = self.conn.prepare(sql)?;
        Ok(Box::new(SqliteStatement {
            conn: &self.conn,
            stmt,
        }))
    }
}

struct SqliteStatement<'conn> {
    conn: &'conn Connection,
    stmt: rusqlite::Statement<'conn>,
}

impl PreparedStatement for SqliteStatement<'_> {
    fn bind(&mut self, name: &str, value: &Value) -> Result<()> {
        let index = self.stmt.parameter_index(name)?.ok_or_else(|| {
            GatewayError::store(format!("statement has no parameter named '{}'", name))
        })?;
        self.stmt.raw_bind_parameter(index, to_sql_value(value))?;
        Ok(())
    }

    fn execute(&mut self) -> Result<Execution> {
        if self.stmt.column_count() > 0 {
            let names = column_names(&self.stmt);
            let rows = self.stmt.raw_query();
            return drain_rows(&names, rows).map(Execution::Rows);
        }

        let rows_affected = self.stmt.raw_execute()?;
        Ok(Execution::Completed(WriteResult {
            rows_affected,
            last_insert_id: self.conn.last_insert_rowid(),
        }))
    }
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

fn drain_rows(names: &[String], mut rows: Rows<'_>) -> Result<Vec<Row>> {
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut map = Row::new();
        for (i, name) in names.iter().enumerate() {
            map.insert(name.clone(), from_sql_value(row.get_ref(i)?));
        }
        result.push(map);
    }
    Ok(result)
}

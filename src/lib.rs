//! # runtara-table-gateway
//!
//! A schema-validated dynamic query builder for a single SQLite table.
//!
//! The gateway discovers a table's columns once, at construction, and uses
//! them as a whitelist: every field reference in a select, insert, update or
//! delete is checked against it before being written into SQL text, and every
//! value is bound as a named parameter. No SQL is written by hand.
//!
//! ## Features
//!
//! - **Schema Introspection**: Columns, declared types and affinities come from the table
//! - **Whitelisted Identifiers**: Unknown fields are dropped; the key field is never written
//! - **Bound Values**: Values travel only as `:column` parameters
//! - **Configurable Conditions**: Equality conditions joined by AND or OR, with optional ordering
//! - **Pluggable Store**: The gateway talks to the database through the [`Store`] trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use runtara_table_gateway::{SqliteStore, TableGateway};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::open("app.db")?;
//!     let mut users = TableGateway::new(store, "users")?;
//!
//!     users.insert_row(&json!({"name": "Ann", "email": "ann@example.com"}))?;
//!     users.update(&json!({"name": "Anne"}), 1)?;
//!
//!     for row in users.select_where(&json!({"name": "Anne"}))? {
//!         println!("{}", row["email"]);
//!     }
//!
//!     users.delete(1)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use runtara_table_gateway::{GatewayConfig, Separator};
//!
//! let config = GatewayConfig::builder("users")
//!     .key_field("id")            // Column used by update/delete (default)
//!     .separator(Separator::Or)   // Join conditions with OR (default: AND)
//!     .order("name ASC")          // Appended verbatim to selects
//!     .build();
//! ```
//!
//! ## Result Buffers
//!
//! Selects are materialized into buffers owned by the gateway. `select_all`
//! fills its buffer once and then keeps returning it; `select_where` appends
//! to its buffer on every call. Call [`TableGateway::clear_results`] to start
//! over.

pub mod config;
pub mod error;
pub mod gateway;
pub mod results;
pub mod schema;
pub mod sql;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::{DEFAULT_KEY_FIELD, GatewayConfig, GatewayConfigBuilder, Separator, SortOrder};
pub use error::{GatewayError, Result};
pub use gateway::TableGateway;
pub use results::ResultBuffers;
pub use schema::{ColumnInfo, Schema};
pub use store::{Execution, PreparedStatement, SqliteStore, Store};
pub use types::{ColumnAffinity, Row, WriteResult};

// Re-export SQL utilities for advanced users
pub use sql::statement::{Statement, StatementFactory};
pub use sql::sanitize::{quote_identifier, validate_identifier};

//! SQL utilities for the table gateway
//!
//! Provides identifier sanitization, condition building, column projection
//! and statement generation.

pub mod condition;
pub mod projection;
pub mod sanitize;
pub mod statement;

pub use condition::{ConditionSet, build_equality, build_order_by_clause};
pub use projection::{project_readable, project_writable};
pub use sanitize::{parameter_name, quote_identifier, validate_identifier};
pub use statement::{Binding, Defect, KEY_PARAMETER, Statement, StatementFactory};

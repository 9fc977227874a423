//! Result buffers for select operations
//!
//! Selects are materialized eagerly into buffers owned by the gateway.
//! The buffers are appended to, never reset implicitly:
//!
//! - the select-all buffer is filled once, and later calls return it as is
//!   while it holds rows;
//! - the select-where buffer grows with every conditional select.
//!
//! Callers who want fresh results call [`ResultBuffers::clear`].

use crate::error::Result;
use crate::types::Row;

/// Rows collected by `select_all` and `select_where`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultBuffers {
    all: Vec<Row>,
    matched: Vec<Row>,
}

impl ResultBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the select-all buffer from `fetch` unless it already holds rows.
    ///
    /// `fetch` is not called when the buffer is non-empty.
    pub fn accumulate_all<F>(&mut self, fetch: F) -> Result<&[Row]>
    where
        F: FnOnce() -> Result<Vec<Row>>,
    {
        if self.all.is_empty() {
            self.all.extend(fetch()?);
        }
        Ok(&self.all)
    }

    /// Append `rows` to the select-where buffer and return the whole buffer
    pub fn accumulate_where(&mut self, rows: Vec<Row>) -> &[Row] {
        self.matched.extend(rows);
        &self.matched
    }

    /// Rows held for select-all
    pub fn all(&self) -> &[Row] {
        &self.all
    }

    /// Rows held for select-where, across every call so far
    pub fn matched(&self) -> &[Row] {
        &self.matched
    }

    /// Empty both buffers
    pub fn clear(&mut self) {
        self.all.clear();
        self.matched.clear();
    }
}

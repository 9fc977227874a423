//! Error types for table gateway operations

use thiserror::Error;

/// Errors that can occur during table gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Schema introspection failed or the configured table/key cannot be used
    #[error("Schema error for table '{table}': {reason}")]
    Schema {
        table: String,
        reason: String,
        #[source]
        source: Option<Box<GatewayError>>,
    },

    /// A condition-requiring statement was built from an empty condition set
    #[error("Malformed query (no usable conditions) `{sql}`: {source}")]
    MalformedQuery {
        sql: String,
        #[source]
        source: Box<GatewayError>,
    },

    /// Every requested column was filtered out by the whitelist
    #[error("Empty projection (no usable columns) `{sql}`: {source}")]
    EmptyProjection {
        sql: String,
        #[source]
        source: Box<GatewayError>,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn schema(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            table: table.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Wrap a store failure raised while introspecting `table`
    pub fn introspection(table: impl Into<String>, source: GatewayError) -> Self {
        Self::Schema {
            table: table.into(),
            reason: "metadata query failed".to_string(),
            source: Some(Box::new(source)),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

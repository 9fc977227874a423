//! Configuration for TableGateway
//!
//! Provides a builder pattern for configuring the gateway, plus the
//! separator and sort order enums used when composing statements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Key field used when none is configured
pub const DEFAULT_KEY_FIELD: &str = "id";

/// Boolean operator joining multiple equality conditions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Separator {
    #[default]
    And,
    Or,
}

impl Separator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Separator::And => "AND",
            Separator::Or => "OR",
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Separator {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AND" => Ok(Separator::And),
            "OR" => Ok(Separator::Or),
            other => Err(GatewayError::validation(format!(
                "Invalid separator: '{}'. Must be 'AND' or 'OR'.",
                other
            ))),
        }
    }
}

/// Sort direction for validated ORDER BY clauses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortOrder {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(GatewayError::validation(format!(
                "Invalid sort order: '{}'. Must be 'asc' or 'desc'.",
                s
            ))),
        }
    }
}

fn default_key_field() -> String {
    DEFAULT_KEY_FIELD.to_string()
}

/// Configuration for a table gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Table the gateway is bound to
    pub table: String,
    /// Column identifying a row for update/delete (default: "id")
    #[serde(rename = "keyField", default = "default_key_field")]
    pub key_field: String,
    /// Operator joining equality conditions (default: AND)
    #[serde(default)]
    pub separator: Separator,
    /// ORDER BY fragment appended verbatim to selects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

impl GatewayConfig {
    /// Configuration for `table` with every other setting at its default
    pub fn new(table: impl Into<String>) -> Self {
        Self::builder(table).build()
    }

    /// Create a new configuration builder
    pub fn builder(table: impl Into<String>) -> GatewayConfigBuilder {
        GatewayConfigBuilder::new(table)
    }
}

/// Builder for GatewayConfig
#[derive(Debug)]
pub struct GatewayConfigBuilder {
    table: String,
    key_field: String,
    separator: Separator,
    order: Option<String>,
}

impl GatewayConfigBuilder {
    /// Create a new builder for the given table
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key_field: default_key_field(),
            separator: Separator::default(),
            order: None,
        }
    }

    /// Set the key field (default: "id")
    pub fn key_field(mut self, name: impl Into<String>) -> Self {
        self.key_field = name.into();
        self
    }

    /// Set the condition separator (default: AND)
    pub fn separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    /// Set the ORDER BY fragment, e.g. `"name DESC"`
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> GatewayConfig {
        GatewayConfig {
            table: self.table,
            key_field: self.key_field,
            separator: self.separator,
            order: self.order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Separator Tests
    // =========================================================================

    #[test]
    fn test_separator_default_is_and() {
        assert_eq!(Separator::default(), Separator::And);
    }

    #[test]
    fn test_separator_from_str_case_insensitive() {
        assert_eq!("and".parse::<Separator>().unwrap(), Separator::And);
        assert_eq!("OR".parse::<Separator>().unwrap(), Separator::Or);
        assert_eq!(" Or ".parse::<Separator>().unwrap(), Separator::Or);
    }

    #[test]
    fn test_separator_from_str_rejects_other_operators() {
        let result = "XOR".parse::<Separator>();
        assert!(matches!(result, Err(GatewayError::Validation(_))));
        assert!("AND 1=1".parse::<Separator>().is_err());
    }

    #[test]
    fn test_separator_display() {
        assert_eq!(Separator::And.to_string(), "AND");
        assert_eq!(Separator::Or.to_string(), "OR");
    }

    // =========================================================================
    // SortOrder Tests
    // =========================================================================

    #[test]
    fn test_sort_order_from_str() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
    }

    #[test]
    fn test_sort_order_invalid() {
        let err = "sideways".parse::<SortOrder>().unwrap_err();
        assert!(err.to_string().contains("Invalid sort order"));
    }

    // =========================================================================
    // GatewayConfig Builder Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::new("users");

        assert_eq!(config.table, "users");
        assert_eq!(config.key_field, "id");
        assert_eq!(config.separator, Separator::And);
        assert!(config.order.is_none());
    }

    #[test]
    fn test_full_custom_config() {
        let config = GatewayConfig::builder("accounts")
            .key_field("account_id")
            .separator(Separator::Or)
            .order("name DESC")
            .build();

        assert_eq!(config.table, "accounts");
        assert_eq!(config.key_field, "account_id");
        assert_eq!(config.separator, Separator::Or);
        assert_eq!(config.order.as_deref(), Some("name DESC"));
    }

    #[test]
    fn test_builder_accepts_string() {
        let config = GatewayConfig::builder(String::from("users"))
            .key_field(String::from("user_id"))
            .build();
        assert_eq!(config.key_field, "user_id");
    }

    // =========================================================================
    // Serde Tests
    // =========================================================================

    #[test]
    fn test_deserialize_minimal_config() {
        let config: GatewayConfig = serde_json::from_str(r#"{"table": "users"}"#).unwrap();
        assert_eq!(config, GatewayConfig::new("users"));
    }

    #[test]
    fn test_deserialize_full_config() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{"table": "users", "keyField": "uid", "separator": "OR", "order": "email ASC"}"#,
        )
        .unwrap();

        assert_eq!(config.key_field, "uid");
        assert_eq!(config.separator, Separator::Or);
        assert_eq!(config.order.as_deref(), Some("email ASC"));
    }

    #[test]
    fn test_serialize_uses_camel_case_key_field() {
        let json = serde_json::to_string(&GatewayConfig::new("users")).unwrap();
        assert!(json.contains("\"keyField\":\"id\""));
        assert!(json.contains("\"separator\":\"AND\""));
        assert!(!json.contains("order"));
    }
}

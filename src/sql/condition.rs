//! Equality condition building
//!
//! Turns a key/value mapping into `"column" = :column` fragments and the
//! bindings for them, and composes validated ORDER BY clauses.

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{Separator, SortOrder};
use crate::schema::Schema;
use crate::sql::sanitize::{parameter_name, quote_identifier};
use crate::sql::statement::Binding;

/// Equality fragments and their bindings, in caller order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    fragments: Vec<String>,
    bindings: Vec<Binding>,
}

impl ConditionSet {
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Join the fragments with `separator` inside one parenthesis group.
    ///
    /// An empty set yields `()`, which no WHERE clause accepts.
    pub fn join(&self, separator: Separator) -> String {
        let glue = format!(" {} ", separator.as_sql());
        format!("({})", self.fragments.join(&glue))
    }
}

/// Build equality conditions from `conditions`.
///
/// Pairs naming a column the schema does not know are dropped, not rejected.
/// The key field is allowed here.
pub fn build_equality(conditions: &Map<String, Value>, schema: &Schema) -> ConditionSet {
    let mut set = ConditionSet::default();

    for (column, value) in conditions {
        if !schema.is_allowed(column) {
            debug!(column = %column, "Ignoring condition on unknown column");
            continue;
        }
        let param = parameter_name(column);
        set.fragments
            .push(format!("{} = {}", quote_identifier(column), param));
        set.bindings
            .push(Binding::new(param, column, schema.coerce(column, value)));
    }

    set
}

/// Build a quoted `"<column>" ASC|DESC` clause for a whitelisted column
pub fn build_order_by_clause(
    column: &str,
    order: SortOrder,
    schema: &Schema,
) -> Result<String, String> {
    if !schema.is_allowed(column) {
        return Err(format!(
            "Invalid sort field: '{}'. Must be a column of '{}'.",
            column,
            schema.table()
        ));
    }

    Ok(format!("{} {}", quote_identifier(column), order.as_sql()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnInfo;
    use serde_json::json;

    fn users_schema() -> Schema {
        Schema::from_columns(
            "users",
            vec![
                ColumnInfo::new("id", "INTEGER").primary_key(),
                ColumnInfo::new("name", "TEXT"),
                ColumnInfo::new("email", "TEXT"),
            ],
        )
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    // ==================== Equality Conditions ====================

    #[test]
    fn test_single_condition() {
        let set = build_equality(&object(json!({"name": "A"})), &users_schema());

        assert_eq!(set.fragments(), ["\"name\" = :name"]);
        assert_eq!(set.bindings().len(), 1);
        assert_eq!(set.bindings()[0].name, ":name");
        assert_eq!(set.bindings()[0].value, json!("A"));
    }

    #[test]
    fn test_conditions_keep_caller_order() {
        let set = build_equality(
            &object(json!({"email": "a@x.com", "name": "A", "id": 3})),
            &users_schema(),
        );

        assert_eq!(
            set.fragments(),
            ["\"email\" = :email", "\"name\" = :name", "\"id\" = :id"]
        );
    }

    #[test]
    fn test_unknown_columns_are_dropped() {
        let set = build_equality(
            &object(json!({"bogus": 1, "name": "A", "1=1; --": "x"})),
            &users_schema(),
        );

        assert_eq!(set.len(), 1);
        assert_eq!(set.bindings()[0].column, "name");
    }

    #[test]
    fn test_condition_value_is_coerced_by_affinity() {
        let set = build_equality(&object(json!({"id": "5"})), &users_schema());
        assert_eq!(set.bindings()[0].value, json!(5));
    }

    #[test]
    fn test_value_never_reaches_fragment() {
        let set = build_equality(&object(json!({"name": "' OR '1'='1"})), &users_schema());
        assert!(!set.fragments()[0].contains("OR"));
        assert_eq!(set.bindings()[0].value, json!("' OR '1'='1"));
    }

    // ==================== Join ====================

    #[test]
    fn test_join_and() {
        let set = build_equality(
            &object(json!({"name": "A", "email": "a@x.com"})),
            &users_schema(),
        );
        assert_eq!(
            set.join(Separator::And),
            "(\"name\" = :name AND \"email\" = :email)"
        );
    }

    #[test]
    fn test_join_or() {
        let set = build_equality(
            &object(json!({"name": "A", "email": "a@x.com"})),
            &users_schema(),
        );
        assert_eq!(
            set.join(Separator::Or),
            "(\"name\" = :name OR \"email\" = :email)"
        );
    }

    #[test]
    fn test_join_empty_yields_empty_group() {
        let set = build_equality(&object(json!({"bogus": 1})), &users_schema());
        assert!(set.is_empty());
        assert_eq!(set.join(Separator::And), "()");
    }

    // ==================== build_order_by_clause ====================

    #[test]
    fn test_order_by_asc() {
        let clause = build_order_by_clause("name", SortOrder::Asc, &users_schema()).unwrap();
        assert_eq!(clause, "\"name\" ASC");
    }

    #[test]
    fn test_order_by_desc_on_key() {
        let clause = build_order_by_clause("id", SortOrder::Desc, &users_schema()).unwrap();
        assert_eq!(clause, "\"id\" DESC");
    }

    #[test]
    fn test_order_by_invalid_field() {
        let result = build_order_by_clause("nonexistent", SortOrder::Asc, &users_schema());
        assert!(result.unwrap_err().contains("Invalid sort field"));
    }
}

//! TableGateway - main entry point for schema-validated single-table access
//!
//! A gateway is bound to one table. Construction introspects the table once;
//! every operation afterwards generates parameterized SQL from the resulting
//! whitelist and runs it through the gateway's [`Store`].

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::config::{GatewayConfig, Separator, SortOrder};
use crate::error::{GatewayError, Result};
use crate::results::ResultBuffers;
use crate::schema::Schema;
use crate::sql::condition::build_order_by_clause;
use crate::sql::sanitize::validate_identifier;
use crate::sql::statement::{Statement, StatementFactory};
use crate::store::{Execution, Store};
use crate::types::{Row, WriteResult};

/// Schema-validated CRUD over a single table
///
/// Owns its whitelist and result buffers. Operations are synchronous and
/// run one statement each; buffers are mutated in place, so selects take
/// `&mut self`.
pub struct TableGateway<S> {
    store: S,
    config: GatewayConfig,
    schema: Schema,
    results: ResultBuffers,
}

impl<S: Store> TableGateway<S> {
    /// Bind a gateway to `table`, using `id` as the key field
    pub fn new(store: S, table: impl Into<String>) -> Result<Self> {
        Self::with_config(store, GatewayConfig::new(table))
    }

    /// Bind a gateway using a full configuration
    ///
    /// Introspects the table; fails with [`GatewayError::Schema`] when the
    /// table or the key field does not exist.
    #[instrument(skip_all, fields(table = %config.table))]
    pub fn with_config(store: S, config: GatewayConfig) -> Result<Self> {
        let schema = Schema::introspect(&store, &config.table)?;
        check_key_field(&schema, &config.key_field)?;

        debug!(
            columns = schema.len(),
            key_field = %config.key_field,
            "Table gateway ready"
        );

        Ok(Self {
            store,
            config,
            schema,
            results: ResultBuffers::new(),
        })
    }

    /// Get a reference to the store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the gateway configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get the column whitelist
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get the select result buffers
    pub fn results(&self) -> &ResultBuffers {
        &self.results
    }

    /// Empty both select result buffers
    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    /// Release the gateway, returning its store
    pub fn into_store(self) -> S {
        self.store
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set the operator joining equality conditions
    pub fn set_separator(&mut self, separator: Separator) {
        self.config.separator = separator;
    }

    /// Set the ORDER BY fragment, appended verbatim to every select
    ///
    /// The fragment is not validated; pass only trusted text such as
    /// `"name DESC"`. See [`TableGateway::set_order_by`] for a checked form.
    pub fn set_order(&mut self, order: impl Into<String>) {
        self.config.order = Some(order.into());
    }

    /// Order selects by a whitelisted column
    pub fn set_order_by(&mut self, column: &str, order: SortOrder) -> Result<()> {
        let clause =
            build_order_by_clause(column, order, &self.schema).map_err(GatewayError::validation)?;
        self.config.order = Some(clause);
        Ok(())
    }

    /// Remove any ORDER BY fragment
    pub fn clear_order(&mut self) {
        self.config.order = None;
    }

    /// Change the key field used by `update` and `delete`
    pub fn set_key_field(&mut self, key_field: impl Into<String>) -> Result<()> {
        let key_field = key_field.into();
        check_key_field(&self.schema, &key_field)?;
        self.config.key_field = key_field;
        Ok(())
    }

    // =========================================================================
    // Selects
    // =========================================================================

    /// Every row of the table
    ///
    /// The first call that finds rows fills the select-all buffer; later
    /// calls return that buffer without querying again.
    #[instrument(skip_all, fields(table = %self.config.table))]
    pub fn select_all(&mut self) -> Result<&[Row]> {
        let statement = StatementFactory::new(&self.schema, &self.config).select_all();
        let store = &self.store;

        let rows = self.results.accumulate_all(|| {
            debug!(sql = %statement.sql, "Querying all rows");
            store.query(&statement.sql)
        })?;

        debug!(rows = rows.len(), "Select-all buffer");
        Ok(rows)
    }

    /// Rows matching every (or, with [`Separator::Or`], any) condition
    ///
    /// `conditions` must be a JSON object; keys naming unknown columns are
    /// ignored. Matches are appended to the select-where buffer and the
    /// whole buffer is returned. An empty or fully ignored condition set
    /// fails with [`GatewayError::MalformedQuery`].
    #[instrument(skip_all, fields(table = %self.config.table))]
    pub fn select_where(&mut self, conditions: &Value) -> Result<&[Row]> {
        let conditions = as_object(conditions, "Conditions")?;
        let statement = StatementFactory::new(&self.schema, &self.config).select_where(conditions);

        let rows = self.run(&statement)?.into_rows();
        debug!(matched = rows.len(), "Select-where matched rows");

        Ok(self.results.accumulate_where(rows))
    }

    /// Selected columns of the rows matching `conditions`
    ///
    /// Unknown columns are dropped from both `columns` and `conditions`.
    /// An empty condition set selects every row. The result is returned
    /// directly and not buffered.
    #[instrument(skip_all, fields(table = %self.config.table))]
    pub fn select_subset_where<C: AsRef<str>>(
        &self,
        columns: &[C],
        conditions: &Value,
    ) -> Result<Vec<Row>> {
        let conditions = as_object(conditions, "Conditions")?;
        let statement = StatementFactory::new(&self.schema, &self.config)
            .select_subset_where(columns.iter().map(|c| c.as_ref()), conditions);

        let rows = self.run(&statement)?.into_rows();
        debug!(rows = rows.len(), "Select-subset rows");
        Ok(rows)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert one row from the known, non-key fields of `data`
    #[instrument(skip_all, fields(table = %self.config.table))]
    pub fn insert_row(&self, data: &Value) -> Result<WriteResult> {
        let data = as_object(data, "Row data")?;
        let statement = StatementFactory::new(&self.schema, &self.config).insert(data);
        self.write(&statement)
    }

    /// Update the row whose key field equals `id`
    ///
    /// Only known, non-key fields of `data` are written. Updating a missing
    /// row is not an error; `rows_affected` is 0.
    #[instrument(skip_all, fields(table = %self.config.table))]
    pub fn update(&self, data: &Value, id: impl Into<Value>) -> Result<WriteResult> {
        let data = as_object(data, "Row data")?;
        let statement = StatementFactory::new(&self.schema, &self.config).update(data, &id.into());
        self.write(&statement)
    }

    /// Delete the row whose key field equals `id`
    #[instrument(skip_all, fields(table = %self.config.table))]
    pub fn delete(&self, id: impl Into<Value>) -> Result<WriteResult> {
        let statement = StatementFactory::new(&self.schema, &self.config).delete(&id.into());
        self.write(&statement)
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn run(&self, statement: &Statement) -> Result<Execution> {
        debug!(
            sql = %statement.sql,
            bindings = statement.bindings.len(),
            "Preparing statement"
        );

        let mut prepared = self
            .store
            .prepare(&statement.sql)
            .map_err(|e| statement.prepare_failed(e))?;

        for binding in &statement.bindings {
            prepared.bind(&binding.name, &binding.value)?;
        }

        prepared.execute()
    }

    fn write(&self, statement: &Statement) -> Result<WriteResult> {
        let result = self.run(statement)?.into_write_result()?;
        debug!(rows_affected = result.rows_affected, "Write complete");
        Ok(result)
    }
}

fn check_key_field(schema: &Schema, key_field: &str) -> Result<()> {
    validate_identifier(key_field).map_err(|reason| GatewayError::schema(schema.table(), reason))?;

    if !schema.is_allowed(key_field) {
        return Err(GatewayError::schema(
            schema.table(),
            format!("key field '{}' is not a column", key_field),
        ));
    }
    Ok(())
}

fn as_object<'v>(value: &'v Value, what: &str) -> Result<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| GatewayError::validation(format!("{} must be a JSON object", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use serde_json::json;

    fn users_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .execute_batch(
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT,
                    email TEXT
                );
                INSERT INTO users (name, email) VALUES
                    ('Ann', 'ann@x.com'),
                    ('Bob', 'bob@x.com'),
                    ('Cid', 'cid@x.com');",
            )
            .unwrap();
        store
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn test_new_uses_id_key() {
        let gateway = TableGateway::new(users_store(), "users").unwrap();
        assert_eq!(gateway.config().key_field, "id");
        assert!(gateway.schema().is_allowed("email"));
        assert!(gateway.results().all().is_empty());
    }

    #[test]
    fn test_missing_key_field_is_schema_error() {
        let config = GatewayConfig::builder("users").key_field("uid").build();
        let result = TableGateway::with_config(users_store(), config);
        assert!(matches!(result, Err(GatewayError::Schema { .. })));
    }

    #[test]
    fn test_missing_table_is_schema_error() {
        let result = TableGateway::new(users_store(), "orders");
        assert!(matches!(result, Err(GatewayError::Schema { .. })));
    }

    // =========================================================================
    // Configuration setters
    // =========================================================================

    #[test]
    fn test_set_order_by_validates_column() {
        let mut gateway = TableGateway::new(users_store(), "users").unwrap();

        gateway.set_order_by("name", SortOrder::Desc).unwrap();
        assert_eq!(gateway.config().order.as_deref(), Some("\"name\" DESC"));

        let err = gateway.set_order_by("bogus", SortOrder::Asc).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(gateway.config().order.as_deref(), Some("\"name\" DESC"));
    }

    #[test]
    fn test_set_key_field() {
        let mut gateway = TableGateway::new(users_store(), "users").unwrap();

        gateway.set_key_field("email").unwrap();
        assert_eq!(gateway.config().key_field, "email");
        assert!(gateway.set_key_field("bogus").is_err());
        assert_eq!(gateway.config().key_field, "email");
    }

    #[test]
    fn test_order_applies_to_selects() {
        let mut gateway = TableGateway::new(users_store(), "users").unwrap();
        gateway.set_order("name DESC");

        let rows = gateway.select_all().unwrap();
        assert_eq!(rows[0]["name"], json!("Cid"));

        gateway.clear_order();
        assert!(gateway.config().order.is_none());
    }

    #[test]
    fn test_separator_or() {
        let mut gateway = TableGateway::new(users_store(), "users").unwrap();
        gateway.set_separator(Separator::Or);

        let rows = gateway
            .select_where(&json!({"name": "Ann", "email": "bob@x.com"}))
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    // =========================================================================
    // Input shape
    // =========================================================================

    #[test]
    fn test_non_object_input_is_validation_error() {
        let mut gateway = TableGateway::new(users_store(), "users").unwrap();

        assert!(matches!(
            gateway.select_where(&json!(["name"])),
            Err(GatewayError::Validation(_))
        ));
        assert!(matches!(
            gateway.insert_row(&json!("Ann")),
            Err(GatewayError::Validation(_))
        ));
    }

    #[test]
    fn test_select_subset_where() {
        let gateway = TableGateway::new(users_store(), "users").unwrap();

        let rows = gateway
            .select_subset_where(&["email", "bogus"], &json!({"name": "Bob"}))
            .unwrap();
        assert_eq!(rows, vec![json!({"email": "bob@x.com"}).as_object().cloned().unwrap()]);

        let all = gateway.select_subset_where(&["id"], &json!({})).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_select_subset_empty_projection() {
        let gateway = TableGateway::new(users_store(), "users").unwrap();
        let result = gateway.select_subset_where(&["bogus"], &json!({}));
        assert!(matches!(result, Err(GatewayError::EmptyProjection { .. })));
    }

    #[test]
    fn test_update_missing_row_affects_nothing() {
        let gateway = TableGateway::new(users_store(), "users").unwrap();
        let result = gateway.update(&json!({"name": "Zed"}), 99).unwrap();
        assert_eq!(result.rows_affected, 0);
    }

    #[test]
    fn test_clear_results() {
        let mut gateway = TableGateway::new(users_store(), "users").unwrap();
        gateway.select_all().unwrap();
        gateway.select_where(&json!({"id": 1})).unwrap();

        gateway.clear_results();

        assert!(gateway.results().all().is_empty());
        assert!(gateway.results().matched().is_empty());
    }
}

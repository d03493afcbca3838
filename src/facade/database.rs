use crate::connection::Executor;
use crate::connection::config::ConnectionConfig;
use crate::core::{BoundStatement, DbError, Operation, Result};
use crate::json::{
    Combinator, ConditionBuilder, DeleteStatementBuilder, Filter, IdentityGenerator, Payload,
    RecordCodec, SelectStatementBuilder, UpdateStatementBuilder,
};
use crate::reporter::{Reporter, TracingReporter};
use crate::result::Record;
use crate::schema::{ID_COLUMN, Schema, SchemaCompiler, TableDefinition, load_schema};
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Outcome of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    TableCreated,
    Updated { rows: usize },
    Deleted { rows: usize },
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableCreated => f.write_str("Table Created"),
            Self::Updated { .. } => f.write_str("Data Updated"),
            Self::Deleted { .. } => f.write_str("Data Deleted"),
        }
    }
}

/// Identity generated for an inserted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inserted {
    pub id: String,
    pub timestamp: i64,
}

impl fmt::Display for Inserted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data Inserted ({})", self.id)
    }
}

/// Schema-driven CRUD over one SQLite connection.
///
/// Tables are described once by a [`Schema`]; afterwards every operation
/// takes plain key-value maps. The connection is opened at construction and
/// released when the value is dropped or [`JsonDb::close`] is called.
///
/// # Examples
///
/// ```
/// use sqlite_as_json::{Combinator, ConnectionConfig, JsonDb, parse_schema};
/// use serde_json::json;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let schema = parse_schema(r#"[{
///     "table_name": "users",
///     "fields": [{"name": "email", "sql_type": "char", "length": 50, "nullable": false}],
///     "config": {"primary_key": "id"}
/// }]"#)?;
///
/// let db = JsonDb::with_schema(ConnectionConfig::memory(), schema)?;
/// db.create_table()?;
///
/// let payload = json!({"email": "a@b.com"}).as_object().cloned().unwrap();
/// let inserted = db.insert_data("users", &payload)?;
///
/// let found = db.search_data("users", &payload, Combinator::And)?;
/// assert_eq!(found[0]["id"], json!(inserted.id));
/// # Ok(())
/// # }
/// ```
pub struct JsonDb {
    executor: Executor,
    schema: Schema,
    identities: IdentityGenerator,
    reporter: Arc<dyn Reporter>,
}

impl JsonDb {
    /// Opens (or creates) the database file `db_path` with the tables
    /// declared in the JSON file `schema_path`.
    pub fn open(db_path: impl AsRef<Path>, schema_path: impl AsRef<Path>) -> Result<Self> {
        let schema = load_schema(schema_path)?;
        Self::with_schema(ConnectionConfig::file(db_path.as_ref()), schema)
    }

    pub fn with_schema(config: ConnectionConfig, schema: Schema) -> Result<Self> {
        Self::with_reporter(config, schema, Arc::new(TracingReporter))
    }

    pub fn with_reporter(
        config: ConnectionConfig,
        schema: Schema,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        config.validate()?;
        let executor = Executor::open(&config).map_err(DbError::Connection)?;

        Ok(Self {
            executor,
            schema,
            identities: IdentityGenerator::new(),
            reporter,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn definition(&self, table: &str) -> Result<&TableDefinition> {
        self.schema
            .table(table)
            .ok_or_else(|| DbError::UnknownTable(table.to_string()))
    }

    /// Drops and recreates every declared table, discarding their rows.
    pub fn create_table(&self) -> Result<Status> {
        let outcome = self.try_create_table();
        let label = match &outcome {
            Err(DbError::TableCreation { table, .. }) => table.clone(),
            _ => self.table_list(),
        };
        self.report(Operation::CreateTable, &label, &outcome);
        outcome
    }

    /// Inserts one row. `id` and `timestamp` are generated and override any
    /// values of the same name in `payload`.
    pub fn insert_data(&self, table: &str, payload: &Payload) -> Result<Inserted> {
        let outcome = self.try_insert(table, payload);
        self.report(Operation::Insert, table, &outcome);
        outcome
    }

    /// Rows matching every (`And`) or any (`Or`) entry of `filter`.
    /// An empty filter returns all rows.
    pub fn search_data(
        &self,
        table: &str,
        filter: &Filter,
        combinator: Combinator,
    ) -> Result<Vec<Record>> {
        let outcome = self.try_search(table, filter, combinator);
        self.report(Operation::Search, table, &outcome);
        outcome
    }

    pub fn search_all(&self, table: &str) -> Result<Vec<Record>> {
        self.search_data(table, &Filter::new(), Combinator::And)
    }

    /// Sets the fields of `payload` on the row with the given `id`.
    pub fn update_data(&self, table: &str, id: &str, payload: &Payload) -> Result<Status> {
        self.update_where(table, &id_filter(id), Combinator::And, payload)
    }

    pub fn update_where(
        &self,
        table: &str,
        filter: &Filter,
        combinator: Combinator,
        payload: &Payload,
    ) -> Result<Status> {
        let outcome = self.try_update(table, Some((filter, combinator)), payload);
        self.report(Operation::Update, table, &outcome);
        outcome
    }

    /// Sets the fields of `payload` on every row of `table`.
    pub fn update_all(&self, table: &str, payload: &Payload) -> Result<Status> {
        let outcome = self.try_update(table, None, payload);
        self.report(Operation::Update, table, &outcome);
        outcome
    }

    pub fn delete_data(&self, table: &str, id: &str) -> Result<Status> {
        self.delete_where(table, &id_filter(id), Combinator::And)
    }

    pub fn delete_where(&self, table: &str, filter: &Filter, combinator: Combinator) -> Result<Status> {
        let outcome = self.try_delete(table, Some((filter, combinator)));
        self.report(Operation::Delete, table, &outcome);
        outcome
    }

    /// Removes every row of `table`.
    pub fn delete_all(&self, table: &str) -> Result<Status> {
        let outcome = self.try_delete(table, None);
        self.report(Operation::Delete, table, &outcome);
        outcome
    }

    /// Releases the connection and reports a failure to close it.
    pub fn close(self) -> Result<()> {
        self.executor.close().map_err(DbError::Connection)
    }

    // ==================== Private Helper Methods ====================

    fn try_create_table(&self) -> Result<Status> {
        for (table, statement) in SchemaCompiler::plan(&self.schema) {
            self.reporter
                .statement(Operation::CreateTable, table, &statement.sql);
        }
        SchemaCompiler::apply(&self.schema, &self.executor)?;
        Ok(Status::TableCreated)
    }

    fn try_insert(&self, table: &str, payload: &Payload) -> Result<Inserted> {
        let definition = self.definition(table)?;
        let identity = self.identities.next_identity();
        let statement = RecordCodec::new(definition)
            .encode_insert(payload, &identity)?
            .into_statement(table);

        self.execute(Operation::Insert, table, &statement)?;
        Ok(Inserted {
            id: identity.id,
            timestamp: identity.timestamp,
        })
    }

    fn try_search(
        &self,
        table: &str,
        filter: &Filter,
        combinator: Combinator,
    ) -> Result<Vec<Record>> {
        let definition = self.definition(table)?;
        let condition = ConditionBuilder::new(definition).build(filter, combinator)?;
        let statement = SelectStatementBuilder::new(table)
            .condition(condition)
            .build();

        self.reporter
            .statement(Operation::Search, table, &statement.sql);
        let result = self
            .executor
            .query(&statement)
            .map_err(|e| DbError::engine(Operation::Search, table, e))?;
        Ok(result.into_records())
    }

    /// `filter` of `None` is the explicit unconditional form; `Some` with an
    /// empty map is rejected.
    fn try_update(
        &self,
        table: &str,
        filter: Option<(&Filter, Combinator)>,
        payload: &Payload,
    ) -> Result<Status> {
        let definition = self.definition(table)?;
        let condition = match filter {
            Some((filter, combinator)) => Some(ConditionBuilder::new(definition).require(
                filter,
                combinator,
                Operation::Update,
            )?),
            None => None,
        };
        let assignment = RecordCodec::new(definition).encode_update_assignment(payload)?;
        let statement = UpdateStatementBuilder::new(table)
            .set(assignment)
            .condition(condition)
            .build();

        let rows = self.execute(Operation::Update, table, &statement)?;
        Ok(Status::Updated { rows })
    }

    fn try_delete(&self, table: &str, filter: Option<(&Filter, Combinator)>) -> Result<Status> {
        let definition = self.definition(table)?;
        let condition = match filter {
            Some((filter, combinator)) => Some(ConditionBuilder::new(definition).require(
                filter,
                combinator,
                Operation::Delete,
            )?),
            None => None,
        };
        let statement = DeleteStatementBuilder::new(table)
            .condition(condition)
            .build();

        let rows = self.execute(Operation::Delete, table, &statement)?;
        Ok(Status::Deleted { rows })
    }

    fn execute(&self, operation: Operation, table: &str, statement: &BoundStatement) -> Result<usize> {
        self.reporter.statement(operation, table, &statement.sql);
        self.executor
            .run(statement)
            .map_err(|e| DbError::engine(operation, table, e))
    }

    fn report<T>(&self, operation: Operation, table: &str, outcome: &Result<T>) {
        match outcome {
            Ok(_) => self.reporter.succeeded(operation, table),
            Err(err) => self.reporter.failed(operation, table, err),
        }
    }

    fn table_list(&self) -> String {
        self.schema
            .tables()
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// `{"id": id}`, or an empty filter when `id` is blank so that the write
/// is rejected instead of matching nothing silently.
fn id_filter(id: &str) -> Filter {
    let mut filter = Filter::new();
    if !id.trim().is_empty() {
        filter.insert(ID_COLUMN.to_string(), JsonValue::String(id.to_string()));
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use serde_json::json;

    fn create_test_db() -> JsonDb {
        let schema = Schema::new(vec![
            TableDefinition::new("users", "id")
                .field(FieldSpec::new("email", "char").length(50).not_null())
                .field(FieldSpec::new("age", "integer")),
        ])
        .unwrap();
        let db = JsonDb::with_reporter(
            ConnectionConfig::memory(),
            schema,
            Arc::new(crate::reporter::SilentReporter),
        )
        .unwrap();
        db.create_table().unwrap();
        db
    }

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insert_and_search_by_id() {
        let db = create_test_db();
        let inserted = db
            .insert_data("users", &payload(json!({"email": "a@b.com", "age": 30})))
            .unwrap();

        let found = db
            .search_data("users", &id_filter(&inserted.id), Combinator::And)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["email"], json!("a@b.com"));
        assert_eq!(found[0]["timestamp"], json!(inserted.timestamp));
    }

    #[test]
    fn test_unknown_table() {
        let db = create_test_db();
        assert!(matches!(db.search_all("nope"), Err(DbError::UnknownTable(_))));
    }

    #[test]
    fn test_blank_id_is_missing_filter() {
        let db = create_test_db();
        assert!(matches!(
            db.delete_data("users", "  "),
            Err(DbError::MissingFilter { .. })
        ));
        assert!(matches!(
            db.update_data("users", "", &payload(json!({"age": 1}))),
            Err(DbError::MissingFilter { .. })
        ));
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(Status::TableCreated.to_string(), "Table Created");
        assert_eq!(Status::Updated { rows: 1 }.to_string(), "Data Updated");
        assert_eq!(Status::Deleted { rows: 0 }.to_string(), "Data Deleted");
    }
}

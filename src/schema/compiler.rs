//! Table definition to DDL
//!
//! Builds `CREATE TABLE` text from a validated [`TableDefinition`] and
//! recreates the whole schema in one engine transaction.

use super::definition::{FieldSpec, ForeignKey, Schema, TableDefinition};
use crate::connection::Executor;
use crate::core::{BoundStatement, DbError, Operation, Result};
use crate::json::validator::quote_ident;

/// Builder for CREATE TABLE SQL statements
pub struct CreateTableBuilder {
    table_name: String,
    columns: Vec<FieldSpec>,
    primary_key: Option<String>,
    foreign_key: Option<ForeignKey>,
}

impl CreateTableBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_key: None,
            foreign_key: None,
        }
    }

    pub fn add_column(mut self, column: FieldSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }

    pub fn from_definition(table: &TableDefinition) -> Self {
        let mut builder = Self::new(table.name()).primary_key(&table.config.primary_key);

        for column in table.columns() {
            builder = builder.add_column(column);
        }

        if let Some(fk) = &table.config.foreign_key {
            builder = builder.foreign_key(fk.clone());
        }

        builder
    }

    pub fn build(self) -> String {
        let mut clauses: Vec<String> = self.columns.iter().map(column_clause).collect();

        if let Some(pk) = &self.primary_key {
            clauses.push(format!("PRIMARY KEY({})", quote_ident(pk)));
        }

        if let Some(fk) = &self.foreign_key {
            clauses.push(format!(
                "FOREIGN KEY({}) REFERENCES {}({})",
                quote_ident(&fk.field),
                quote_ident(&fk.reference_table),
                quote_ident(&fk.reference_table_field)
            ));
        }

        format!(
            "CREATE TABLE {} ({})",
            quote_ident(&self.table_name),
            clauses.join(", ")
        )
    }
}

fn column_clause(column: &FieldSpec) -> String {
    let sql_type = column.sql_type.trim().to_ascii_uppercase();
    let length = column.length.map(|l| format!("({})", l)).unwrap_or_default();
    let null_constraint = if column.nullable { "" } else { " NOT NULL" };
    format!(
        "{} {}{}{}",
        quote_ident(&column.name),
        sql_type,
        length,
        null_constraint
    )
}

pub struct SchemaCompiler;

impl SchemaCompiler {
    pub fn compile(table: &TableDefinition) -> String {
        CreateTableBuilder::from_definition(table).build()
    }

    pub fn drop_statement(table: &TableDefinition) -> String {
        format!("DROP TABLE IF EXISTS {}", quote_ident(table.name()))
    }

    /// Statements recreating `schema`, each tagged with its table.
    ///
    /// Drops run in reverse declaration order so that referencing tables
    /// are gone before the tables they reference; creates run in
    /// declaration order.
    pub fn plan(schema: &Schema) -> Vec<(&str, BoundStatement)> {
        let drops = schema
            .tables()
            .iter()
            .rev()
            .map(|t| (t.name(), BoundStatement::plain(Self::drop_statement(t))));
        let creates = schema
            .tables()
            .iter()
            .map(|t| (t.name(), BoundStatement::plain(Self::compile(t))));
        drops.chain(creates).collect()
    }

    /// Drops and recreates every table. All or nothing: on failure the
    /// engine rolls the whole batch back and the error names the table
    /// whose statement failed.
    pub fn apply(schema: &Schema, executor: &Executor) -> Result<()> {
        let plan = Self::plan(schema);
        let statements: Vec<BoundStatement> = plan.iter().map(|(_, s)| s.clone()).collect();

        executor.run_batch(&statements).map_err(|failure| {
            let table = plan.get(failure.index).map(|(t, _)| *t).unwrap_or_default();
            DbError::engine(Operation::CreateTable, table, failure.source)
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableDefinition {
        TableDefinition::new("users", "id").field(FieldSpec::new("email", "char").length(50).not_null())
    }

    #[test]
    fn test_compile_adds_identity_columns_and_key_once() {
        assert_eq!(
            SchemaCompiler::compile(&users()),
            "CREATE TABLE \"users\" (\"id\" CHAR(32) NOT NULL, \"timestamp\" INTEGER NOT NULL, \
             \"email\" CHAR(50) NOT NULL, PRIMARY KEY(\"id\"))"
        );
    }

    #[test]
    fn test_nullable_fields_have_no_constraint() {
        let table = TableDefinition::new("notes", "id").field(FieldSpec::new("body", "text"));
        let sql = SchemaCompiler::compile(&table);
        assert!(sql.contains("\"body\" TEXT, PRIMARY KEY"));
    }

    #[test]
    fn test_compile_foreign_key() {
        let table = TableDefinition::new("posts", "id")
            .field(FieldSpec::new("author", "char").length(32))
            .foreign_key("author", "users", "id");

        let sql = SchemaCompiler::compile(&table);
        assert!(sql.ends_with(
            "PRIMARY KEY(\"id\"), FOREIGN KEY(\"author\") REFERENCES \"users\"(\"id\"))"
        ));
        assert_eq!(sql.matches("PRIMARY KEY").count(), 1);
    }

    #[test]
    fn test_plan_drops_in_reverse_then_creates() {
        let posts = TableDefinition::new("posts", "id")
            .field(FieldSpec::new("author", "char").length(32))
            .foreign_key("author", "users", "id");
        let schema = Schema::new(vec![users(), posts]).unwrap();

        let plan: Vec<(&str, String)> = SchemaCompiler::plan(&schema)
            .into_iter()
            .map(|(t, s)| (t, s.sql))
            .collect();

        assert_eq!(plan[0], ("posts", "DROP TABLE IF EXISTS \"posts\"".to_string()));
        assert_eq!(plan[1], ("users", "DROP TABLE IF EXISTS \"users\"".to_string()));
        assert_eq!(plan[2].0, "users");
        assert!(plan[2].1.starts_with("CREATE TABLE \"users\""));
        assert_eq!(plan[3].0, "posts");
    }
}

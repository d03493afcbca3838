//! Payload to SQL
//!
//! Turns key-value payloads into bound INSERT / UPDATE statements. Column
//! names are checked against the owning [`TableDefinition`]; values only
//! ever travel as named parameters.

use super::Payload;
use super::condition::Condition;
use super::identity::Identity;
use super::validator::quote_ident;
use crate::core::{BoundStatement, DbError, Params, Result, Value};
use crate::schema::{ID_COLUMN, TIMESTAMP_COLUMN, TableDefinition, is_identity_column};

/// Columns and values of one INSERT, in physical order.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedInsert {
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl EncodedInsert {
    pub fn into_statement(self, table_name: &str) -> BoundStatement {
        InsertStatementBuilder::new(table_name)
            .columns(self.columns)
            .values(self.values)
            .build()
    }
}

/// `"col" = :s0, "col2" = :s1` plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub sql: String,
    pub params: Params,
}

pub struct RecordCodec<'a> {
    table: &'a TableDefinition,
}

impl<'a> RecordCodec<'a> {
    pub fn new(table: &'a TableDefinition) -> Self {
        Self { table }
    }

    /// `id` and `timestamp` first, then the payload keys in payload order.
    ///
    /// Caller-supplied `id` / `timestamp` keys are replaced by `identity`.
    pub fn encode_insert(&self, payload: &Payload, identity: &Identity) -> Result<EncodedInsert> {
        let mut columns = vec![ID_COLUMN.to_string(), TIMESTAMP_COLUMN.to_string()];
        let mut values = vec![
            Value::Text(identity.id.clone()),
            Value::Integer(identity.timestamp),
        ];

        for (key, value) in payload {
            if is_identity_column(key) {
                continue;
            }
            if !self.table.is_writable(key) {
                return Err(DbError::unknown_column(self.table.name(), key));
            }
            columns.push(key.clone());
            values.push(self.bind_value(key, value)?);
        }

        Ok(EncodedInsert { columns, values })
    }

    pub fn encode_update_assignment(&self, payload: &Payload) -> Result<Assignment> {
        if payload.is_empty() {
            return Err(DbError::EmptyUpdate(self.table.name().to_string()));
        }

        let mut parts = Vec::with_capacity(payload.len());
        let mut params = Vec::with_capacity(payload.len());

        for (i, (key, value)) in payload.iter().enumerate() {
            if is_identity_column(key) {
                return Err(DbError::immutable_column(self.table.name(), key));
            }
            if !self.table.is_writable(key) {
                return Err(DbError::unknown_column(self.table.name(), key));
            }
            let placeholder = format!(":s{}", i);
            parts.push(format!("{} = {}", quote_ident(key), placeholder));
            params.push((placeholder, self.bind_value(key, value)?));
        }

        Ok(Assignment {
            sql: parts.join(", "),
            params,
        })
    }

    fn bind_value(&self, column: &str, value: &serde_json::Value) -> Result<Value> {
        Value::try_from(value)
            .map_err(|reason| DbError::invalid_value(self.table.name(), column, reason))
    }
}

/// Builder for INSERT SQL statements
pub struct InsertStatementBuilder {
    table_name: String,
    columns: Vec<String>,
    values: Vec<Value>,
}

impl InsertStatementBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn values(mut self, values: Vec<Value>) -> Self {
        self.values = values;
        self
    }

    pub fn build(self) -> BoundStatement {
        let cols: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders: Vec<String> = (0..self.values.len()).map(|i| format!(":c{}", i)).collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table_name),
            cols.join(", "),
            placeholders.join(", ")
        );

        let params = placeholders.into_iter().zip(self.values).collect();
        BoundStatement::new(sql, params)
    }
}

/// Builder for UPDATE SQL statements
pub struct UpdateStatementBuilder {
    table_name: String,
    assignment: Option<Assignment>,
    condition: Option<Condition>,
}

impl UpdateStatementBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            assignment: None,
            condition: None,
        }
    }

    pub fn set(mut self, assignment: Assignment) -> Self {
        self.assignment = Some(assignment);
        self
    }

    pub fn condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }

    pub fn build(self) -> BoundStatement {
        let (set_sql, mut params) = match self.assignment {
            Some(a) => (a.sql, a.params),
            None => (String::new(), Vec::new()),
        };
        let where_part = where_clause(self.condition, &mut params);

        BoundStatement::new(
            format!(
                "UPDATE {} SET {}{}",
                quote_ident(&self.table_name),
                set_sql,
                where_part
            ),
            params,
        )
    }
}

/// Builder for DELETE SQL statements
pub struct DeleteStatementBuilder {
    table_name: String,
    condition: Option<Condition>,
}

impl DeleteStatementBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            condition: None,
        }
    }

    pub fn condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }

    pub fn build(self) -> BoundStatement {
        let mut params = Vec::new();
        let where_part = where_clause(self.condition, &mut params);

        BoundStatement::new(
            format!("DELETE FROM {}{}", quote_ident(&self.table_name), where_part),
            params,
        )
    }
}

/// Builder for SELECT statements over every column of one table
pub struct SelectStatementBuilder {
    table_name: String,
    condition: Option<Condition>,
}

impl SelectStatementBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            condition: None,
        }
    }

    pub fn condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }

    pub fn build(self) -> BoundStatement {
        let mut params = Vec::new();
        let where_part = where_clause(self.condition, &mut params);

        BoundStatement::new(
            format!("SELECT * FROM {}{}", quote_ident(&self.table_name), where_part),
            params,
        )
    }
}

fn where_clause(condition: Option<Condition>, params: &mut Params) -> String {
    match condition {
        Some(condition) => {
            params.extend(condition.params);
            format!(" WHERE {}", condition.sql)
        }
        None => String::new(),
    }
}

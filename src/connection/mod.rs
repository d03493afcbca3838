pub mod config;

use crate::core::{BoundStatement, EngineError, Value};
use crate::result::QueryResult;
use config::{ConnectionConfig, DbLocation};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Failure of one statement inside a batch. Nothing of the batch was kept.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the failing statement
    pub index: usize,
    pub source: EngineError,
}

/// Runs statements against the single engine connection.
///
/// Every call takes the connection mutex, so one executor can be shared
/// between threads and statements never interleave.
pub struct Executor {
    conn: Mutex<Connection>,
}

impl Executor {
    pub fn open(config: &ConnectionConfig) -> Result<Self, EngineError> {
        let flags = config.open_flags();
        let conn = match &config.location {
            DbLocation::File(path) => Connection::open_with_flags(path, flags)?,
            DbLocation::Memory => Connection::open_in_memory_with_flags(flags)?,
        };
        conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, EngineError> {
        Ok(self.conn.lock()?)
    }

    /// Executes one write statement and commits it.
    ///
    /// On failure the transaction is dropped, which rolls it back.
    pub fn run(&self, statement: &BoundStatement) -> Result<usize, EngineError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let affected = tx.execute(&statement.sql, statement.named_params().as_slice())?;
        tx.commit()?;
        Ok(affected)
    }

    /// Executes all statements in one transaction.
    pub fn run_batch(&self, statements: &[BoundStatement]) -> Result<usize, BatchFailure> {
        let fail = |index: usize| move |source: EngineError| BatchFailure { index, source };

        let mut conn = self.lock().map_err(fail(0))?;
        let tx = conn
            .transaction()
            .map_err(|e| fail(0)(EngineError::from(e)))?;

        let mut affected = 0;
        for (index, statement) in statements.iter().enumerate() {
            affected += tx
                .execute(&statement.sql, statement.named_params().as_slice())
                .map_err(|e| fail(index)(EngineError::from(e)))?;
        }

        let last = statements.len().saturating_sub(1);
        tx.commit().map_err(|e| fail(last)(EngineError::from(e)))?;
        Ok(affected)
    }

    /// Executes a read and materializes every row.
    pub fn query(&self, statement: &BoundStatement) -> Result<QueryResult, EngineError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&statement.sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map(statement.named_params().as_slice(), |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(Value::from))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(QueryResult::new(columns, rows))
    }

    /// Closes the connection, reporting what `Drop` would swallow.
    pub fn close(self) -> Result<(), EngineError> {
        let conn = self.conn.into_inner()?;
        conn.close().map_err(|(_, e)| EngineError::Sqlite(e))
    }
}

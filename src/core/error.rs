use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading or validating the table definitions or the
/// connection settings. Raised at construction, never later.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read schema file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid table definition '{table}': {reason}")]
    Invalid { table: String, reason: String },

    #[error("schema declares no tables")]
    Empty,

    #[error("table '{0}' is declared more than once")]
    DuplicateTable(String),

    #[error("invalid connection settings: {0}")]
    InvalidConnection(String),
}

/// Failure reported by the engine while running a statement.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection lock poisoned")]
    LockPoisoned,
}

impl<T> From<std::sync::PoisonError<T>> for EngineError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}

/// Public operations, used to label errors and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTable,
    Insert,
    Search,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateTable => "create table",
            Self::Insert => "insert",
            Self::Search => "search",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("connection error: {0}")]
    Connection(#[source] EngineError),

    #[error("failed to create table '{table}', no table was changed: {source}")]
    TableCreation {
        table: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to insert into '{table}': {source}")]
    Insert {
        table: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to search '{table}': {source}")]
    Search {
        table: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to update '{table}': {source}")]
    Update {
        table: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to delete from '{table}': {source}")]
    Delete {
        table: String,
        #[source]
        source: EngineError,
    },

    #[error("refusing to {operation} '{table}' without a filter; use the unconditional variant")]
    MissingFilter { table: String, operation: Operation },

    #[error("schema violation on '{table}.{column}': {reason}")]
    SchemaViolation {
        table: String,
        column: String,
        reason: String,
    },

    #[error("table '{0}' is not declared in the schema")]
    UnknownTable(String),

    #[error("update of '{0}' has no fields to set")]
    EmptyUpdate(String),
}

impl DbError {
    pub(crate) fn unknown_column(table: &str, column: &str) -> Self {
        Self::SchemaViolation {
            table: table.to_string(),
            column: column.to_string(),
            reason: "column is not declared".to_string(),
        }
    }

    pub(crate) fn immutable_column(table: &str, column: &str) -> Self {
        Self::SchemaViolation {
            table: table.to_string(),
            column: column.to_string(),
            reason: "identity columns cannot be updated".to_string(),
        }
    }

    pub(crate) fn invalid_value(table: &str, column: &str, reason: String) -> Self {
        Self::SchemaViolation {
            table: table.to_string(),
            column: column.to_string(),
            reason,
        }
    }

    /// Wraps an engine failure into the error of the operation that hit it.
    pub(crate) fn engine(operation: Operation, table: &str, source: EngineError) -> Self {
        let table = table.to_string();
        match operation {
            Operation::CreateTable => Self::TableCreation { table, source },
            Operation::Insert => Self::Insert { table, source },
            Operation::Search => Self::Search { table, source },
            Operation::Update => Self::Update { table, source },
            Operation::Delete => Self::Delete { table, source },
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

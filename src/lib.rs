// ============================================================================
// sqlite-as-json Library
// ============================================================================

pub mod core;
pub mod schema;
pub mod json;
pub mod result;
pub mod connection;
pub mod facade;
pub mod reporter;
pub mod prelude;

// Re-export main types for convenience
pub use facade::{Inserted, JsonDb, Status};
pub use crate::core::{ConfigError, DbError, EngineError, Operation, Result, Value};
pub use result::{QueryResult, Record};
pub use json::{Combinator, Filter, Payload};
pub use schema::{FieldSpec, ForeignKey, Schema, TableDefinition, load_schema, parse_schema};
pub use reporter::{Reporter, SilentReporter, TracingReporter};

// Re-export connection API
pub use connection::config::{ConnectionConfig, DbLocation, ThreadingMode};

//! Declarative table definitions
//!
//! - `definition.rs` - TableDefinition model and validation
//! - `compiler.rs` - DDL generation and schema recreation
//! - `loader.rs` - schema file loading

pub mod compiler;
pub mod definition;
pub mod loader;

pub use compiler::{CreateTableBuilder, SchemaCompiler};
pub use definition::{
    FieldSpec, ForeignKey, ID_COLUMN, Schema, TIMESTAMP_COLUMN, TableConfig, TableDefinition,
    is_identity_column,
};
pub use loader::{load_schema, parse_schema};

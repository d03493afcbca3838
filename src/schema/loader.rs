use super::definition::{Schema, TableDefinition};
use crate::core::ConfigError;
use std::fs;
use std::path::Path;

/// Reads and validates a schema file: a JSON array of table definitions.
pub fn load_schema(path: impl AsRef<Path>) -> Result<Schema, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schema(&content)
}

pub fn parse_schema(content: &str) -> Result<Schema, ConfigError> {
    let tables: Vec<TableDefinition> = serde_json::from_str(content)?;
    Schema::new(tables)
}

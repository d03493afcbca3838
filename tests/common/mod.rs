#![allow(dead_code)]

use serde_json::Value as JsonValue;
use sqlite_as_json::{ConnectionConfig, JsonDb, Payload, SilentReporter, parse_schema};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const USERS_SCHEMA: &str = r#"[
    {
        "table_name": "users",
        "fields": [
            { "name": "email", "sql_type": "char", "length": 50, "nullable": false }
        ],
        "config": { "primary_key": "id" }
    }
]"#;

pub const SHOP_SCHEMA: &str = r#"[
    {
        "table_name": "customers",
        "fields": [
            { "name": "email", "sql_type": "char", "length": 50, "nullable": false },
            { "name": "name", "sql_type": "varchar", "length": 100 },
            { "name": "age", "sql_type": "integer" },
            { "name": "city", "sql_type": "text" }
        ],
        "config": { "primary_key": "id" }
    },
    {
        "table_name": "orders",
        "fields": [
            { "name": "customer_id", "type": "char", "length": "32", "nullable": false },
            { "name": "total", "type": "real" },
            { "name": "note", "type": "text" }
        ],
        "config": {
            "primary_key": "id",
            "foreign_key": {
                "field": "customer_id",
                "reference_table": "customers",
                "reference_table_field": "id"
            }
        }
    }
]"#;

/// A database file in its own temp directory, removed on drop.
pub struct TestDb {
    pub db: JsonDb,
    pub path: PathBuf,
    _dir: TempDir,
}

impl TestDb {
    pub fn new(schema: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = JsonDb::with_reporter(
            ConnectionConfig::file(&path),
            parse_schema(schema).unwrap(),
            Arc::new(SilentReporter),
        )
        .unwrap();
        db.create_table().unwrap();

        Self { db, path, _dir: dir }
    }

    /// A second, raw connection to the same file for catalog inspection.
    pub fn raw(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(&self.path).unwrap()
    }

    /// Column names of `table` as the engine reports them.
    pub fn catalog_columns(&self, table: &str) -> Vec<(String, String, bool)> {
        let conn = self.raw();
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info(\"{}\")", table))
            .unwrap();
        stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)? == 1,
            ))
        })
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
    }

    pub fn catalog_tables(&self) -> Vec<String> {
        let conn = self.raw();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap()
    }
}

pub fn obj(value: JsonValue) -> Payload {
    value.as_object().cloned().expect("test payload must be an object")
}

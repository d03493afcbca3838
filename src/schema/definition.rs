use crate::core::ConfigError;
use crate::json::validator::{validate_identifier, validate_sql_type};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Generated per row at insert time, first physical column of every table.
pub const ID_COLUMN: &str = "id";
/// Insert time in epoch milliseconds, second physical column of every table.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

pub fn is_identity_column(name: &str) -> bool {
    name == ID_COLUMN || name == TIMESTAMP_COLUMN
}

/// One column as declared in the schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(alias = "type")]
    pub sql_type: String,
    #[serde(default, deserialize_with = "deserialize_length")]
    pub length: Option<u32>,
    /// `false` emits `NOT NULL`.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            length: None,
            nullable: true,
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    fn default_id() -> Self {
        Self::new(ID_COLUMN, "char").length(32).not_null()
    }

    fn default_timestamp() -> Self {
        Self::new(TIMESTAMP_COLUMN, "integer").not_null()
    }
}

/// Schema files in the wild write lengths both as `50` and `"50"`.
fn deserialize_length<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Length {
        Number(u32),
        Text(String),
    }

    match Option::<Length>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Length::Number(n)) => Ok(Some(n)),
        Some(Length::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid column length '{}'", s))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub field: String,
    pub reference_table: String,
    pub reference_table_field: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub primary_key: String,
    #[serde(default, deserialize_with = "deserialize_foreign_key")]
    pub foreign_key: Option<ForeignKey>,
}

/// `"foreign_key": {}` means no foreign key.
fn deserialize_foreign_key<'de, D>(deserializer: D) -> Result<Option<ForeignKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// A table as declared in the schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub table_name: String,
    pub fields: Vec<FieldSpec>,
    pub config: TableConfig,
}

impl TableDefinition {
    pub fn new(table_name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            fields: Vec::new(),
            config: TableConfig {
                primary_key: primary_key.into(),
                foreign_key: None,
            },
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn foreign_key(
        mut self,
        field: impl Into<String>,
        reference_table: impl Into<String>,
        reference_table_field: impl Into<String>,
    ) -> Self {
        self.config.foreign_key = Some(ForeignKey {
            field: field.into(),
            reference_table: reference_table.into(),
            reference_table_field: reference_table_field.into(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.table_name
    }

    /// Physical column order: `id`, `timestamp`, then the declared fields.
    ///
    /// The identity columns always get their fixed types. A declared `id` or
    /// `timestamp` entry only names the column; its type, length and
    /// nullability are ignored.
    pub fn columns(&self) -> Vec<FieldSpec> {
        let mut columns = vec![FieldSpec::default_id(), FieldSpec::default_timestamp()];
        columns.extend(
            self.fields
                .iter()
                .filter(|f| !is_identity_column(&f.name))
                .cloned(),
        );
        columns
    }

    /// Whether `name` is a physical column, identity columns included.
    pub fn has_column(&self, name: &str) -> bool {
        is_identity_column(name) || self.fields.iter().any(|f| f.name == name)
    }

    /// Whether a payload may write `name`.
    pub fn is_writable(&self, name: &str) -> bool {
        !is_identity_column(name) && self.fields.iter().any(|f| f.name == name)
    }

    fn invalid(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::Invalid {
            table: self.table_name.clone(),
            reason: reason.into(),
        }
    }

    /// Checks everything that does not depend on other tables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier(&self.table_name).map_err(|reason| self.invalid(reason))?;

        if self.fields.is_empty() {
            return Err(self.invalid("table must declare at least one field"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            validate_identifier(&field.name).map_err(|reason| self.invalid(reason))?;
            validate_sql_type(&field.sql_type)
                .map_err(|reason| self.invalid(format!("field '{}': {}", field.name, reason)))?;
            if !seen.insert(field.name.as_str()) {
                return Err(self.invalid(format!("field '{}' is declared twice", field.name)));
            }
        }

        let primary_key = &self.config.primary_key;
        if !self.has_column(primary_key) {
            return Err(self.invalid(format!(
                "primary key '{}' is not a column of the table",
                primary_key
            )));
        }

        if let Some(fk) = &self.config.foreign_key {
            if !self.has_column(&fk.field) {
                return Err(self.invalid(format!(
                    "foreign key '{}' is not a column of the table",
                    fk.field
                )));
            }
            validate_identifier(&fk.reference_table).map_err(|reason| self.invalid(reason))?;
            validate_identifier(&fk.reference_table_field)
                .map_err(|reason| self.invalid(reason))?;
        }

        Ok(())
    }
}

/// The validated, immutable set of table definitions a facade works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new(tables: Vec<TableDefinition>) -> Result<Self, ConfigError> {
        if tables.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut names = HashSet::new();
        for table in &tables {
            table.validate()?;
            if !names.insert(table.table_name.as_str()) {
                return Err(ConfigError::DuplicateTable(table.table_name.clone()));
            }
        }

        // References into tables of this schema must name a real column.
        // Tables outside the schema are left to the engine.
        for table in &tables {
            let Some(fk) = &table.config.foreign_key else {
                continue;
            };
            let referenced = tables.iter().find(|t| t.table_name == fk.reference_table);
            if let Some(referenced) = referenced {
                if !referenced.has_column(&fk.reference_table_field) {
                    return Err(table.invalid(format!(
                        "foreign key references unknown column '{}.{}'",
                        fk.reference_table, fk.reference_table_field
                    )));
                }
            }
        }

        Ok(Self { tables })
    }

    pub fn tables(&self) -> &[TableDefinition] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.table_name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> TableDefinition {
        TableDefinition::new("users", "id").field(FieldSpec::new("email", "char").length(50).not_null())
    }

    #[test]
    fn test_deserialize_original_file_format() {
        let table: TableDefinition = serde_json::from_value(json!({
            "table_name": "my_table",
            "fields": [
                { "name": "email", "type": "char", "length": "50", "nullable": false },
                { "name": "note", "sql_type": "text" }
            ],
            "config": { "primary_key": "id", "foreign_key": {} }
        }))
        .unwrap();

        assert_eq!(table.fields[0].sql_type, "char");
        assert_eq!(table.fields[0].length, Some(50));
        assert!(!table.fields[0].nullable);
        assert_eq!(table.fields[1].length, None);
        assert!(table.fields[1].nullable);
        assert_eq!(table.config.foreign_key, None);
    }

    #[test]
    fn test_bad_length_is_rejected() {
        let result: Result<FieldSpec, _> =
            serde_json::from_value(json!({ "name": "a", "type": "char", "length": "fifty" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_identity_columns_come_first() {
        let table = users()
            .field(FieldSpec::new("timestamp", "char").length(20))
            .field(FieldSpec::new("password", "char").length(50));

        let names: Vec<String> = table.columns().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["id", "timestamp", "email", "password"]);
    }

    #[test]
    fn test_declared_identity_columns_keep_fixed_types() {
        let table = users()
            .field(FieldSpec::new("id", "integer"))
            .field(FieldSpec::new("timestamp", "char").length(20));

        let columns = table.columns();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0], FieldSpec::new("id", "char").length(32).not_null());
        assert_eq!(columns[1], FieldSpec::new("timestamp", "integer").not_null());
    }

    #[test]
    fn test_validate_rejects_bad_definitions() {
        assert!(users().validate().is_ok());
        assert!(TableDefinition::new("users", "id").validate().is_err());
        assert!(TableDefinition::new("users", "missing")
            .field(FieldSpec::new("email", "char"))
            .validate()
            .is_err());
        assert!(TableDefinition::new("users; DROP", "id")
            .field(FieldSpec::new("email", "char"))
            .validate()
            .is_err());
        assert!(users()
            .field(FieldSpec::new("email", "text"))
            .validate()
            .is_err());
        assert!(users().foreign_key("owner", "people", "id").validate().is_err());
    }

    #[test]
    fn test_schema_checks_cross_table_references() {
        let people = TableDefinition::new("people", "id").field(FieldSpec::new("name", "text"));
        let pets = TableDefinition::new("pets", "id")
            .field(FieldSpec::new("owner", "char").length(32))
            .foreign_key("owner", "people", "nickname");

        assert!(matches!(
            Schema::new(vec![people.clone(), pets]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            Schema::new(vec![people.clone(), people]),
            Err(ConfigError::DuplicateTable(_))
        ));
        assert!(matches!(Schema::new(vec![]), Err(ConfigError::Empty)));
    }
}

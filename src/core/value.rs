use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde_json::{Number, Value as JsonValue};

/// A scalar as SQLite stores it.
///
/// Payload values are converted into this type before binding and result
/// columns are converted back from it, so JSON never reaches the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Converts a result column back into JSON.
    ///
    /// Non-finite reals have no JSON form and come back as `null`; blobs
    /// become arrays of byte values.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Integer(i) => JsonValue::Number((*i).into()),
            Self::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::Blob(bytes) => {
                JsonValue::Array(bytes.iter().map(|b| JsonValue::Number((*b).into())).collect())
            }
        }
    }
}

impl TryFrom<&JsonValue> for Value {
    type Error = String;

    /// SQLite has no boolean or document types: booleans are stored as 0/1
    /// and arrays/objects as their JSON text. Integers outside the `i64`
    /// range are rejected rather than rounded to a real.
    fn try_from(json: &JsonValue) -> Result<Self, Self::Error> {
        Ok(match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Integer(i64::from(*b)),
            JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Integer(i),
                (None, Some(f)) if n.is_f64() => Self::Float(f),
                _ => return Err(format!("integer {} does not fit in a 64-bit signed column", n)),
            },
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => Self::Text(json.to_string()),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(f) => Self::Float(f),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Self::Integer(i) => ToSqlOutput::from(*i),
            Self::Float(f) => ToSqlOutput::from(*f),
            Self::Text(s) => ToSqlOutput::from(s.as_str()),
            Self::Blob(bytes) => ToSqlOutput::from(bytes.as_slice()),
        })
    }
}

use super::Value;
use rusqlite::types::ToSql;

/// Named parameters in binding order, e.g. `(":c0", Value::Text(..))`.
pub type Params = Vec<(String, Value)>;

/// SQL text together with the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    pub params: Params,
}

impl BoundStatement {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A statement without placeholders (DDL).
    pub fn plain(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Borrowed form accepted by `rusqlite` as named parameters.
    pub(crate) fn named_params(&self) -> Vec<(&str, &dyn ToSql)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}

//! Filter map to WHERE clause
//!
//! `{"a": 1, "b": 2}` with `AND` becomes `"a" = :w0 AND "b" = :w1`.

use super::Filter;
use super::validator::quote_ident;
use crate::core::{DbError, Operation, Params, Result, Value};
use crate::schema::TableDefinition;
use std::fmt;
use std::str::FromStr;

/// Boolean operator placed between every pair of filter clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Combinator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("and") {
            Ok(Self::And)
        } else if s.eq_ignore_ascii_case("or") {
            Ok(Self::Or)
        } else {
            Err(format!("unknown combinator '{}', expected AND or OR", s))
        }
    }
}

/// A boolean SQL expression plus the values bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub sql: String,
    pub params: Params,
}

pub struct ConditionBuilder<'a> {
    table: &'a TableDefinition,
}

impl<'a> ConditionBuilder<'a> {
    pub fn new(table: &'a TableDefinition) -> Self {
        Self { table }
    }

    /// `None` for an empty filter, which read paths treat as "all rows".
    pub fn build(&self, filter: &Filter, combinator: Combinator) -> Result<Option<Condition>> {
        if filter.is_empty() {
            return Ok(None);
        }

        let mut clauses = Vec::with_capacity(filter.len());
        let mut params = Vec::with_capacity(filter.len());

        for (i, (field, expected)) in filter.iter().enumerate() {
            if !self.table.has_column(field) {
                return Err(DbError::unknown_column(self.table.name(), field));
            }

            let column = quote_ident(field);
            let value = Value::try_from(expected)
                .map_err(|reason| DbError::invalid_value(self.table.name(), field, reason))?;
            match value {
                // `= NULL` never matches
                Value::Null => clauses.push(format!("{} IS NULL", column)),
                value => {
                    let placeholder = format!(":w{}", i);
                    clauses.push(format!("{} = {}", column, placeholder));
                    params.push((placeholder, value));
                }
            }
        }

        let separator = format!(" {} ", combinator.as_sql());
        Ok(Some(Condition {
            sql: clauses.join(&separator),
            params,
        }))
    }

    /// Write-path variant: an empty filter is rejected instead of matching
    /// every row.
    pub fn require(
        &self,
        filter: &Filter,
        combinator: Combinator,
        operation: Operation,
    ) -> Result<Condition> {
        self.build(filter, combinator)?
            .ok_or_else(|| DbError::MissingFilter {
                table: self.table.name().to_string(),
                operation,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use serde_json::json;

    fn table() -> TableDefinition {
        TableDefinition::new("t", "id")
            .field(FieldSpec::new("a", "integer"))
            .field(FieldSpec::new("b", "integer"))
            .field(FieldSpec::new("note", "text"))
    }

    fn filter(value: serde_json::Value) -> Filter {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_and_or_joining_preserves_order() {
        let table = table();
        let builder = ConditionBuilder::new(&table);

        let and = builder
            .build(&filter(json!({"b": 2, "a": 1})), Combinator::And)
            .unwrap()
            .unwrap();
        assert_eq!(and.sql, "\"b\" = :w0 AND \"a\" = :w1");
        assert_eq!(
            and.params,
            vec![
                (":w0".to_string(), Value::Integer(2)),
                (":w1".to_string(), Value::Integer(1))
            ]
        );

        let or = builder
            .build(&filter(json!({"a": 1, "b": 2})), Combinator::Or)
            .unwrap()
            .unwrap();
        assert_eq!(or.sql, "\"a\" = :w0 OR \"b\" = :w1");
    }

    #[test]
    fn test_values_are_never_inlined() {
        let table = table();
        let condition = ConditionBuilder::new(&table)
            .build(&filter(json!({"note": "x' OR '1'='1"})), Combinator::And)
            .unwrap()
            .unwrap();

        assert_eq!(condition.sql, "\"note\" = :w0");
    }

    #[test]
    fn test_null_uses_is_null() {
        let table = table();
        let condition = ConditionBuilder::new(&table)
            .build(&filter(json!({"note": null, "a": 1})), Combinator::And)
            .unwrap()
            .unwrap();

        assert_eq!(condition.sql, "\"note\" IS NULL AND \"a\" = :w1");
        assert_eq!(condition.params.len(), 1);
    }

    #[test]
    fn test_empty_filter() {
        let table = table();
        let builder = ConditionBuilder::new(&table);

        assert_eq!(builder.build(&Filter::new(), Combinator::And).unwrap(), None);
        assert!(matches!(
            builder.require(&Filter::new(), Combinator::And, Operation::Delete),
            Err(DbError::MissingFilter { operation: Operation::Delete, .. })
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let table = table();
        let result = ConditionBuilder::new(&table).build(&filter(json!({"c": 1})), Combinator::And);
        assert!(matches!(result, Err(DbError::SchemaViolation { .. })));
    }

    #[test]
    fn test_identity_columns_are_filterable() {
        let table = table();
        let result = ConditionBuilder::new(&table)
            .build(&filter(json!({"id": "abc", "timestamp": 5})), Combinator::And);
        assert!(result.unwrap().is_some());
    }

    #[test]
    fn test_parse_combinator() {
        assert_eq!("and".parse::<Combinator>().unwrap(), Combinator::And);
        assert_eq!("OR".parse::<Combinator>().unwrap(), Combinator::Or);
        assert!("xor".parse::<Combinator>().is_err());
        assert_eq!(Combinator::default(), Combinator::And);
    }
}

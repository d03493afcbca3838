//! Identifier allowlisting
//!
//! Table, column and type names come from the schema file, so they are
//! checked here before they are ever placed into SQL text. Values never go
//! through this path; they are always bound.

use lazy_static::lazy_static;
use regex::Regex;

const MAX_IDENTIFIER_LEN: usize = 64;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref SQL_TYPE: Regex = Regex::new(r"^[A-Za-z][A-Za-z ]*$").unwrap();
}

const SQL_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TABLE", "FROM", "WHERE",
    "JOIN", "UNION", "ORDER", "GROUP", "INDEX", "PRIMARY", "FOREIGN", "KEY", "REFERENCES",
    "NULL", "NOT", "AND", "OR", "VALUES", "INTO", "SET", "PRAGMA", "ATTACH", "DETACH",
];

/// Checks a table or column name. Returns the reason on rejection.
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("identifier cannot be empty".to_string());
    }

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(format!(
            "identifier '{}' is too long (max {} characters)",
            name, MAX_IDENTIFIER_LEN
        ));
    }

    if !IDENTIFIER.is_match(name) {
        return Err(format!(
            "identifier '{}' must start with a letter or underscore and contain only letters, numbers and underscores",
            name
        ));
    }

    if SQL_KEYWORDS.iter().any(|kw| name.eq_ignore_ascii_case(kw)) {
        return Err(format!("identifier cannot be SQL keyword: {}", name));
    }

    Ok(())
}

/// Checks a column type name such as `char` or `double precision`.
pub fn validate_sql_type(sql_type: &str) -> Result<(), String> {
    if SQL_TYPE.is_match(sql_type.trim()) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid column type", sql_type))
    }
}

/// Double-quotes an identifier that already passed `validate_identifier`.
pub fn quote_ident(ident: &str) -> String {
    let escaped = ident.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

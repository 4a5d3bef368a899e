//! Storage trait definition.
//!
//! Defines the storage engine contract the schema upgrader and settings
//! migrator work against, so both can be exercised over any backend that
//! can list tables, describe columns and run statements.

use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// Storage engine handle consumed by the upgrade and migration passes.
pub trait Storage {
    /// Lists the names of all ordinary tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn tables(&self) -> Result<Vec<String>>;

    /// Checks whether a table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn has_table(&self, table: &str) -> Result<bool> {
        Ok(self.tables()?.iter().any(|t| t == table))
    }

    /// Lists the column names of `table` in declaration order.
    ///
    /// Returns an empty list if the table does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be described.
    fn columns(&self, table: &str) -> Result<Vec<String>>;

    /// Lists the definitions of indexes and triggers attached to `table`,
    /// in an order that can be replayed.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn schema_objects(&self, table: &str) -> Result<Vec<String>>;

    /// Runs a single auto-committing statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    fn execute(&mut self, sql: &str) -> Result<()>;

    /// Runs `statements` in order inside one transaction.
    ///
    /// Either every statement takes effect or, on the first failure, the
    /// transaction is rolled back and none of them do. Foreign keys are
    /// checked once, before commit, rather than per statement, so a table
    /// that others reference can be dropped and replaced.
    ///
    /// # Errors
    ///
    /// Returns an error naming the failing statement's storage error.
    fn execute_in_transaction(&mut self, statements: &[&str]) -> Result<()>;

    /// Runs a single-row, single-column query with one text parameter.
    ///
    /// Returns `None` when no row matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn query_value(&self, sql: &str, param: &str) -> Result<Option<StoredValue>>;
}

/// A loosely-typed value as stored by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoredValue {
    /// SQL NULL.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl StoredValue {
    /// Returns true for SQL NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => f.write_str(s),
            Self::Blob(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}

impl From<rusqlite::types::Value> for StoredValue {
    fn from(value: rusqlite::types::Value) -> Self {
        use rusqlite::types::Value;
        match value {
            Value::Null => Self::Null,
            Value::Integer(i) => Self::Integer(i),
            Value::Real(r) => Self::Real(r),
            Value::Text(s) => Self::Text(s),
            Value::Blob(b) => Self::Blob(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(StoredValue::Null.to_string(), "NULL");
        assert_eq!(StoredValue::Integer(42).to_string(), "42");
        assert_eq!(StoredValue::Real(4.5).to_string(), "4.5");
        assert_eq!(StoredValue::Text("#ff0000".into()).to_string(), "#ff0000");
        assert_eq!(StoredValue::Blob(b"abc".to_vec()).to_string(), "abc");
    }

    #[test]
    fn test_from_rusqlite_value() {
        use rusqlite::types::Value;
        assert_eq!(StoredValue::from(Value::Null), StoredValue::Null);
        assert_eq!(StoredValue::from(Value::Integer(7)), StoredValue::Integer(7));
        assert!(StoredValue::from(Value::Null).is_null());
    }
}

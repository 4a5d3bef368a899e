//! `SQLite` storage implementation.
//!
//! Provides the [`Storage`] contract over a rusqlite connection, plus the
//! read helpers the rest of the application uses on the history table.

use crate::error::{Result, StorageError};
use crate::storage::history::HistoryRecord;
use crate::storage::schema::{LIST_TABLES_SQL, SCHEMA_OBJECTS_SQL};
use crate::storage::traits::{Storage, StoredValue};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::path::{Path, PathBuf};
use tracing::warn;

/// SQLite-based storage implementation.
///
/// # Examples
///
/// ```
/// use scanstore::storage::{SqliteStorage, Storage};
///
/// let mut storage = SqliteStorage::in_memory().unwrap();
/// storage.execute("CREATE TABLE history (value TEXT)").unwrap();
/// assert_eq!(storage.tables().unwrap(), vec!["history".to_string()]);
/// ```
pub struct SqliteStorage {
    /// `SQLite` connection.
    conn: Connection,
    /// Path to the database file (None for in-memory).
    path: Option<PathBuf>,
}

impl SqliteStorage {
    /// Opens or creates a `SQLite` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Database(e.to_string()))?;
            }
        }

        let conn = Connection::open(&path).map_err(StorageError::from)?;

        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Opens an existing database without write access.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(StorageError::from)?;

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Creates an in-memory `SQLite` database.
    ///
    /// Useful for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;

        Ok(Self { conn, path: None })
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the underlying connection for the application's own queries.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Lists all history records ordered by identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the history table is missing or lacks the
    /// current columns.
    pub fn history_records(&self) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, value, timestamp, format FROM history ORDER BY id")
            .map_err(StorageError::from)?;

        let records = stmt
            .query_map([], |row| {
                Ok(HistoryRecord {
                    id: row.get(0)?,
                    value: row.get(1)?,
                    timestamp: row.get(2)?,
                    format: row.get(3)?,
                })
            })
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(records)
    }

    /// Returns true if foreign key constraints are enforced.
    ///
    /// # Errors
    ///
    /// Returns an error if the pragma cannot be read.
    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        let enabled = self
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(enabled)
    }

    fn set_foreign_keys(&self, enabled: bool) -> Result<()> {
        let sql = if enabled {
            "PRAGMA foreign_keys = ON;"
        } else {
            "PRAGMA foreign_keys = OFF;"
        };
        self.conn.execute_batch(sql).map_err(StorageError::from)?;
        Ok(())
    }

    fn run_transaction(&mut self, statements: &[&str], check_foreign_keys: bool) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| StorageError::Transaction(e.to_string()))?;

        let mut outcome = Ok(());
        for sql in statements {
            if let Err(e) = tx.execute_batch(sql) {
                outcome = Err(e.to_string());
                break;
            }
        }

        if outcome.is_ok() && check_foreign_keys {
            outcome = match foreign_key_violations(&tx) {
                Ok(0) => Ok(()),
                Ok(n) => Err(format!("{n} foreign key violations")),
                Err(e) => Err(e.to_string()),
            };
        }

        if let Err(reason) = outcome {
            if let Err(rollback) = tx.rollback() {
                warn!("rollback failed: {rollback}");
            }
            return Err(StorageError::Transaction(reason).into());
        }

        tx.commit()
            .map_err(|e| StorageError::Transaction(e.to_string()))?;
        Ok(())
    }

    /// Returns the number of history rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the history table is missing.
    #[allow(clippy::cast_sign_loss)]
    pub fn history_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count as usize)
    }
}

impl Storage for SqliteStorage {
    fn tables(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(LIST_TABLES_SQL)
            .map_err(StorageError::from)?;

        let tables = stmt
            .query_map([], |row| row.get(0))
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(StorageError::from)?;

        Ok(tables)
    }

    fn columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?) ORDER BY cid")
            .map_err(StorageError::from)?;

        let columns = stmt
            .query_map(params![table], |row| row.get(0))
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(StorageError::from)?;

        Ok(columns)
    }

    fn schema_objects(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(SCHEMA_OBJECTS_SQL)
            .map_err(StorageError::from)?;

        let objects = stmt
            .query_map(params![table], |row| row.get(0))
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(StorageError::from)?;

        Ok(objects)
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).map_err(StorageError::from)?;
        Ok(())
    }

    fn execute_in_transaction(&mut self, statements: &[&str]) -> Result<()> {
        // The pragma is a no-op inside a transaction
        let enforced = self.foreign_keys_enabled()?;
        if enforced {
            self.set_foreign_keys(false)?;
        }

        let result = self.run_transaction(statements, enforced);

        if enforced {
            if let Err(e) = self.set_foreign_keys(true) {
                warn!("failed to re-enable foreign keys: {e}");
            }
        }
        result
    }

    fn query_value(&self, sql: &str, param: &str) -> Result<Option<StoredValue>> {
        let value: Option<rusqlite::types::Value> = self
            .conn
            .query_row(sql, params![param], |row| row.get(0))
            .optional()
            .map_err(StorageError::from)?;

        Ok(value.map(StoredValue::from))
    }
}

fn foreign_key_violations(conn: &Connection) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
    let mut rows = stmt.query([])?;
    let mut count = 0;
    while rows.next()?.is_some() {
        count += 1;
    }
    Ok(count)
}

//! Error types for scanstore operations.
//!
//! This module provides the error hierarchy using `thiserror` for storage,
//! settings migration and file system operations. Startup code logs and
//! absorbs most of these; they surface as values in the startup reports.

use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type alias for scanstore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage-related errors (database operations).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Settings conversion and persistence errors.
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

impl Error {
    /// Returns true if the failure came from a storage condition that may
    /// clear up on a later run.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Storage-specific errors for database operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or statement error.
    #[error("database error: {0}")]
    Database(String),

    /// The database could not be opened for this startup.
    #[error("database is not open")]
    NotOpen,

    /// A multi-statement transaction failed and was rolled back.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// The engine could not do the work right now (busy, locked, I/O error
    /// or full disk). Retrying later may succeed.
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Returns true if the failure is worth retrying on a later run.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Settings-specific errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A legacy value could not be coerced to its target type.
    #[error("can't convert {value} to {target} for key {key}")]
    Conversion {
        /// Legacy key being migrated.
        key: String,
        /// Textual rendition of the offending value.
        value: String,
        /// Target type name.
        target: &'static str,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

// Implement From traits for standard library and dependency errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::from(err))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull,
            ) => Self::Unavailable(err.to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Settings(SettingsError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_config() {
        let err = Error::Config {
            message: "bad root".to_string(),
        };
        assert_eq!(err.to_string(), "configuration error: bad root");
    }

    #[test]
    fn test_storage_error_display() {
        assert_eq!(StorageError::NotOpen.to_string(), "database is not open");

        let err = StorageError::Transaction("rollback".to_string());
        assert!(err.to_string().contains("rollback"));
    }

    #[test]
    fn test_conversion_error_display() {
        let err = SettingsError::Conversion {
            key: "history_size".to_string(),
            value: "lots".to_string(),
            target: "int",
        };
        assert_eq!(
            err.to_string(),
            "can't convert lots to int for key history_size"
        );
    }

    #[test]
    fn test_io_error_variants() {
        let err = IoError::DirectoryFailed {
            path: "/tmp/dir".to_string(),
            reason: "read-only".to_string(),
        };
        assert!(err.to_string().contains("directory"));
        assert!(err.to_string().contains("read-only"));

        let err = IoError::WriteFailed {
            path: "/tmp/out".to_string(),
            reason: "disk full".to_string(),
        };
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_rusqlite_error_to_error() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: Error = rusqlite_err.into();
        assert!(matches!(err, Error::Storage(StorageError::Database(_))));
    }

    #[test]
    fn test_busy_and_io_errors_are_transient() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let err: Error = busy.into();
        assert!(matches!(err, Error::Storage(StorageError::Unavailable(_))));
        assert!(err.is_transient());

        let io = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
            None,
        );
        assert!(StorageError::from(io).is_transient());
    }

    #[test]
    fn test_schema_errors_are_not_transient() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some("no such column: key".to_string()),
        );
        let err = StorageError::from(err);
        assert!(matches!(err, StorageError::Database(_)));
        assert!(!err.is_transient());
        assert!(!Error::Config { message: String::new() }.is_transient());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err: serde_json::Error = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(
            err,
            Error::Settings(SettingsError::Serialization(_))
        ));
    }
}

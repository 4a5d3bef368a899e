//! # scanstore
//!
//! Schema upgrade and settings migration for a barcode scanner's local
//! scan history database.
//!
//! On every startup the database under the application's storage root is
//! located, opened and brought to the current schema, and settings left in
//! the legacy key/value table are moved into the structured settings store
//! once. Every step checks the structure it is about to change, so running
//! the sequence again is harmless.
//!
//! ## Features
//!
//! - **Location**: reproduces the `LocalStorage` hashed file name so an
//!   existing database is found
//! - **Schema upgrade**: structural checks instead of a version counter,
//!   with a transactional rebuild where `SQLite` can't alter in place
//! - **Settings migration**: declarative key table with defensive value
//!   coercion

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]

pub mod cli;
pub mod database;
pub mod error;
pub mod location;
pub mod settings;
pub mod storage;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

pub use database::{Database, StartupReport};
pub use location::StorageLocation;

// Re-export storage types
pub use storage::{HistoryRecord, SchemaState, SqliteStorage, Storage, StoredValue, UpgradeReport};

// Re-export settings types
pub use settings::{
    LEGACY_SETTINGS, SettingKey, SettingKind, SettingValue, Settings, SettingsFile,
    SettingsReport, SettingsSink,
};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

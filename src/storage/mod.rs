//! Storage layer for scanstore.
//!
//! Provides the storage engine contract, its `SQLite` implementation, the
//! history schema and the structural upgrade that brings old databases to
//! the current schema.

pub mod history;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod upgrade;

pub use history::HistoryRecord;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StoredValue};
pub use upgrade::{SchemaState, SchemaStep, StepFailure, UpgradeReport, upgrade};

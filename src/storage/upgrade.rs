//! Structural schema upgrade.
//!
//! Each step checks the structural fact it is about to change ("does the
//! history table have a format column?") and only then acts, so the whole
//! pass can be repeated on every startup. Failures are logged and recorded
//! in the [`UpgradeReport`]; the next startup retries the same checks.

use crate::storage::schema::{
    ADD_FORMAT_SQL, CREATE_HISTORY_SQL, HISTORY_COLUMNS, HISTORY_FIELD_FORMAT, HISTORY_FIELD_ID,
    HISTORY_TABLE, REBUILD_HISTORY_SQL, SETTINGS_TABLE,
};
use crate::storage::traits::Storage;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Structural facts that together make up the schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaState {
    /// Columns of the history table, or `None` if it does not exist.
    pub history_columns: Option<Vec<String>>,
    /// Whether the legacy settings table is still present.
    pub legacy_settings: bool,
}

impl SchemaState {
    /// Reads the structural state from `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table list or history columns can't be read.
    pub fn inspect<S: Storage + ?Sized>(storage: &S) -> crate::Result<Self> {
        let tables = storage.tables()?;
        let history_columns = if tables.iter().any(|t| t == HISTORY_TABLE) {
            Some(storage.columns(HISTORY_TABLE)?)
        } else {
            None
        };
        Ok(Self {
            history_columns,
            legacy_settings: tables.iter().any(|t| t == SETTINGS_TABLE),
        })
    }

    /// Returns true if the history table exists.
    #[must_use]
    pub const fn has_history(&self) -> bool {
        self.history_columns.is_some()
    }

    /// Returns true if the history table has `column`.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.history_columns
            .as_ref()
            .is_some_and(|columns| columns.iter().any(|c| c == column))
    }

    /// Returns true once no further upgrade or migration is needed.
    #[must_use]
    pub fn is_current(&self) -> bool {
        HISTORY_COLUMNS.iter().all(|c| self.has_column(c)) && !self.legacy_settings
    }
}

/// A structural change the upgrader can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaStep {
    /// Reading the table list or column set.
    Inspect,
    /// Creating the history table on a fresh install.
    CreateHistory,
    /// Adding the format column to an older history table.
    AddFormatColumn,
    /// Rebuilding the history table to give it an identity column.
    RebuildWithIdentity,
}

impl SchemaStep {
    /// Returns a short name for logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inspect => "inspect",
            Self::CreateHistory => "create_history",
            Self::AddFormatColumn => "add_format_column",
            Self::RebuildWithIdentity => "rebuild_with_identity",
        }
    }
}

impl fmt::Display for SchemaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step that failed, with the storage error it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// The failed step.
    pub step: SchemaStep,
    /// Storage error text.
    pub error: String,
}

/// Outcome of one upgrade pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpgradeReport {
    /// Steps that were needed and succeeded, in order.
    pub applied: Vec<SchemaStep>,
    /// Steps that were needed and failed.
    pub failed: Vec<StepFailure>,
    /// Whether the legacy settings table is present and awaits migration.
    pub legacy_settings: bool,
}

impl UpgradeReport {
    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns true if nothing needed changing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.failed.is_empty()
    }

    fn record(&mut self, step: SchemaStep, result: crate::Result<()>) -> bool {
        match result {
            Ok(()) => {
                info!("schema step {step} applied");
                self.applied.push(step);
                true
            }
            Err(e) => {
                warn!("schema step {step} failed: {e}");
                self.failed.push(StepFailure {
                    step,
                    error: e.to_string(),
                });
                false
            }
        }
    }
}

/// Brings the history table to the current schema.
///
/// Never fails as a whole: every failure is logged and recorded in the
/// returned report, and the remaining steps still run where possible.
pub fn upgrade<S: Storage + ?Sized>(storage: &mut S) -> UpgradeReport {
    let mut report = UpgradeReport::default();

    let tables = match storage.tables() {
        Ok(tables) => tables,
        Err(e) => {
            report.record(SchemaStep::Inspect, Err(e));
            return report;
        }
    };
    debug!("tables: {tables:?}");
    report.legacy_settings = tables.iter().any(|t| t == SETTINGS_TABLE);

    if !tables.iter().any(|t| t == HISTORY_TABLE) {
        info!("initializing the database");
        let result = storage.execute(CREATE_HISTORY_SQL);
        report.record(SchemaStep::CreateHistory, result);
        return report;
    }

    let mut columns = match storage.columns(HISTORY_TABLE) {
        Ok(columns) => columns,
        Err(e) => {
            report.record(SchemaStep::Inspect, Err(e));
            return report;
        }
    };

    if !columns.iter().any(|c| c == HISTORY_FIELD_FORMAT) {
        info!("adding {HISTORY_FIELD_FORMAT} to the database");
        let result = storage.execute(ADD_FORMAT_SQL);
        if report.record(SchemaStep::AddFormatColumn, result) {
            match storage.columns(HISTORY_TABLE) {
                Ok(updated) => columns = updated,
                Err(e) => {
                    report.record(SchemaStep::Inspect, Err(e));
                    return report;
                }
            }
        }
    }

    if !columns.iter().any(|c| c == HISTORY_FIELD_ID) {
        info!("adding {HISTORY_FIELD_ID} to the database");
        let objects = match storage.schema_objects(HISTORY_TABLE) {
            Ok(objects) => objects,
            Err(e) => {
                report.record(SchemaStep::Inspect, Err(e));
                return report;
            }
        };
        let mut statements: Vec<&str> = REBUILD_HISTORY_SQL.to_vec();
        statements.extend(objects.iter().map(String::as_str));
        let result = storage.execute_in_transaction(&statements);
        report.record(SchemaStep::RebuildWithIdentity, result);
    }

    report
}

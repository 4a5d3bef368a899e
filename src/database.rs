//! Startup sequence for the history database.
//!
//! Resolves the database location, opens the database, upgrades its schema
//! and migrates legacy settings, in that order. Nothing here fails the
//! caller: problems are logged, recorded in the [`StartupReport`] and
//! retried on the next startup.

use crate::error::StorageError;
use crate::location::StorageLocation;
use crate::settings::{SettingsReport, SettingsSink, migrate_settings};
use crate::storage::{SqliteStorage, UpgradeReport, upgrade};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// What happened during one startup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StartupReport {
    /// Error text if the database could not be opened.
    pub open_error: Option<String>,
    /// Schema upgrade outcome, if the database was opened.
    pub upgrade: Option<UpgradeReport>,
    /// Settings migration outcome, if a legacy table was found.
    pub settings: Option<SettingsReport>,
}

impl StartupReport {
    /// Returns true if every attempted step succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.open_error.is_none()
            && self.upgrade.as_ref().is_none_or(UpgradeReport::is_clean)
            && self
                .settings
                .as_ref()
                .is_none_or(|s| s.table_dropped && !s.has_read_failures())
    }
}

/// The opened history database and where it lives.
///
/// Owns the connection for the rest of the process; other parts of the
/// application borrow it through [`Database::storage`].
pub struct Database {
    location: StorageLocation,
    storage: Option<SqliteStorage>,
    report: StartupReport,
}

impl Database {
    /// Runs the startup sequence under `storage_root`, sending migrated
    /// legacy settings to `sink`.
    ///
    /// Always returns a value. If the database can't be opened, the result
    /// is invalid (see [`Database::is_valid`]) and the rest of the
    /// sequence is skipped.
    pub fn initialize<K: SettingsSink + ?Sized>(storage_root: &Path, sink: &mut K) -> Self {
        let location = StorageLocation::resolve(storage_root);
        let mut report = StartupReport::default();

        let mut storage = match SqliteStorage::open(&location.database_path) {
            Ok(storage) => storage,
            Err(e) => {
                warn!(
                    "failed to open {}: {e}",
                    location.database_path.display()
                );
                report.open_error = Some(e.to_string());
                return Self {
                    location,
                    storage: None,
                    report,
                };
            }
        };

        let upgrade_report = upgrade(&mut storage);
        if upgrade_report.legacy_settings {
            report.settings = Some(migrate_settings(&mut storage, sink));
        } else {
            debug!("no legacy settings");
        }
        report.upgrade = Some(upgrade_report);

        Self {
            location,
            storage: Some(storage),
            report,
        }
    }

    /// Returns true if the database is open.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.storage.is_some()
    }

    /// Returns the resolved locations.
    #[must_use]
    pub const fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Returns the directory reserved for saved images. It may not exist.
    #[must_use]
    pub fn asset_dir(&self) -> &Path {
        &self.location.asset_dir
    }

    /// Returns the startup report.
    #[must_use]
    pub const fn report(&self) -> &StartupReport {
        &self.report
    }

    /// Returns the open storage.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotOpen`] if startup could not open it.
    pub fn storage(&self) -> crate::Result<&SqliteStorage> {
        self.storage.as_ref().ok_or_else(|| StorageError::NotOpen.into())
    }

    /// Returns the open storage mutably.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotOpen`] if startup could not open it.
    pub fn storage_mut(&mut self) -> crate::Result<&mut SqliteStorage> {
        self.storage.as_mut().ok_or_else(|| StorageError::NotOpen.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::storage::Storage;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_root() {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings::default();

        let db = Database::initialize(temp.path(), &mut settings);

        assert!(db.is_valid());
        assert!(db.report().is_clean());
        assert!(db.report().settings.is_none());
        assert!(db.location().database_path.exists());
        assert!(!db.asset_dir().exists());
        assert_eq!(db.storage().unwrap().history_count().unwrap(), 0);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unopenable_database_gives_invalid_handle() {
        let temp = TempDir::new().unwrap();
        let location = StorageLocation::resolve(temp.path());
        std::fs::create_dir_all(&location.database_path).unwrap();
        let mut settings = Settings::default();

        let mut db = Database::initialize(temp.path(), &mut settings);

        assert!(!db.is_valid());
        assert!(db.report().open_error.is_some());
        assert!(db.report().upgrade.is_none());
        assert!(!db.report().is_clean());
        assert!(db.storage().is_err());
        assert!(db.storage_mut().is_err());
    }

    #[test]
    fn test_connection_stays_usable() {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings::default();

        let mut db = Database::initialize(temp.path(), &mut settings);
        db.storage_mut()
            .unwrap()
            .execute("INSERT INTO history (value, timestamp, format) VALUES ('x', 't', 'QR_CODE')")
            .unwrap();

        assert_eq!(db.storage().unwrap().history_count().unwrap(), 1);
    }
}

//! One-time migration of the legacy settings table.

use crate::error::SettingsError;
use crate::settings::convert::{is_blank, to_bool, to_int, to_text};
use crate::settings::{LEGACY_SETTINGS, LegacySetting, SettingKind, SettingsSink};
use crate::storage::schema::{DROP_SETTINGS_SQL, SELECT_SETTING_SQL};
use crate::storage::{Storage, StoredValue};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Why a legacy key was not migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No row, or a NULL or blank value.
    Missing,
    /// The value could not be converted to the key's type.
    Unconvertible {
        /// Conversion error text.
        error: String,
    },
    /// The lookup failed in a way that cannot succeed on this table, such
    /// as a missing column.
    Unreadable {
        /// Storage error text.
        error: String,
    },
    /// The lookup hit a transient storage condition.
    ReadFailed {
        /// Storage error text.
        error: String,
    },
}

/// A legacy key left unmigrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSetting {
    /// Legacy key.
    pub key: &'static str,
    /// Why it was skipped.
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Outcome of a settings migration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsReport {
    /// Legacy keys whose values reached the sink.
    pub applied: Vec<&'static str>,
    /// Legacy keys left unmigrated.
    pub skipped: Vec<SkippedSetting>,
    /// Why the sink could not persist the migrated values, if it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
    /// Whether the legacy table was dropped.
    pub table_dropped: bool,
}

impl SettingsReport {
    /// Returns true if any lookup hit a transient storage failure.
    #[must_use]
    pub fn has_read_failures(&self) -> bool {
        self.skipped
            .iter()
            .any(|s| matches!(s.reason, SkipReason::ReadFailed { .. }))
    }

    fn skip(&mut self, key: &'static str, reason: SkipReason) {
        self.skipped.push(SkippedSetting { key, reason });
    }
}

/// Copies every known legacy setting into `sink`, then drops the legacy
/// table.
///
/// Keys are independent: a missing, unconvertible or unreadable value only
/// skips that key. The sink is flushed before the drop. The table is kept,
/// so the next startup can retry, if a lookup hit a transient storage
/// failure or the flush failed; setters are simply called again then.
pub fn migrate_settings<S, K>(storage: &mut S, sink: &mut K) -> SettingsReport
where
    S: Storage + ?Sized,
    K: SettingsSink + ?Sized,
{
    info!("migrating settings");
    let mut report = SettingsReport::default();

    for setting in &LEGACY_SETTINGS {
        match storage.query_value(SELECT_SETTING_SQL, setting.key) {
            Ok(Some(value)) if !is_blank(&value) => {
                debug!("{} = {value}", setting.key);
                match apply(setting, &value, sink) {
                    Ok(()) => report.applied.push(setting.key),
                    Err(e) => {
                        warn!("{e}");
                        report.skip(
                            setting.key,
                            SkipReason::Unconvertible {
                                error: e.to_string(),
                            },
                        );
                    }
                }
            }
            Ok(_) => {
                debug!("{} not set", setting.key);
                report.skip(setting.key, SkipReason::Missing);
            }
            Err(e) if e.is_transient() => {
                warn!("{}: {e}", setting.key);
                report.skip(
                    setting.key,
                    SkipReason::ReadFailed {
                        error: e.to_string(),
                    },
                );
            }
            Err(e) => {
                warn!("{}: {e}", setting.key);
                report.skip(
                    setting.key,
                    SkipReason::Unreadable {
                        error: e.to_string(),
                    },
                );
            }
        }
    }

    if report.has_read_failures() {
        warn!("keeping the legacy settings table for the next attempt");
        return report;
    }

    if let Err(e) = sink.flush() {
        warn!("failed to persist migrated settings, keeping the legacy table: {e}");
        report.persist_error = Some(e.to_string());
        return report;
    }

    match storage.execute(DROP_SETTINGS_SQL) {
        Ok(()) => {
            info!("legacy settings table dropped");
            report.table_dropped = true;
        }
        Err(e) => warn!("failed to drop the legacy settings table: {e}"),
    }

    report
}

fn apply<K: SettingsSink + ?Sized>(
    setting: &LegacySetting,
    value: &StoredValue,
    sink: &mut K,
) -> Result<(), SettingsError> {
    let target = setting.target;
    let unconvertible = || SettingsError::Conversion {
        key: setting.key.to_string(),
        value: value.to_string(),
        target: setting.kind().as_str(),
    };

    match setting.kind() {
        SettingKind::Bool => {
            let b = to_bool(value).ok_or_else(unconvertible)?;
            debug!("{target} = {b}");
            sink.set_bool(target, b);
        }
        SettingKind::Int => {
            let i = to_int(value).ok_or_else(unconvertible)?;
            debug!("{target} = {i}");
            sink.set_int(target, i);
        }
        SettingKind::Text => {
            let s = to_text(value).ok_or_else(unconvertible)?;
            debug!("{target} = {s}");
            sink.set_text(target, s);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IoError, StorageError};
    use crate::settings::{SettingKey, SettingValue};
    use crate::storage::SqliteStorage;

    /// Sink that records every setter call.
    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<(SettingKey, SettingValue)>,
        flushes: usize,
        fail_flush: bool,
    }

    impl SettingsSink for RecordingSink {
        fn set_bool(&mut self, key: SettingKey, value: bool) {
            self.calls.push((key, SettingValue::Bool(value)));
        }

        fn set_int(&mut self, key: SettingKey, value: i32) {
            self.calls.push((key, SettingValue::Int(value)));
        }

        fn set_text(&mut self, key: SettingKey, value: String) {
            self.calls.push((key, SettingValue::Text(value)));
        }

        fn flush(&mut self) -> crate::Result<()> {
            self.flushes += 1;
            if self.fail_flush {
                return Err(IoError::WriteFailed {
                    path: "settings.json".to_string(),
                    reason: "read-only file system".to_string(),
                }
                .into());
            }
            Ok(())
        }
    }

    /// Storage whose lookups of one key report the database as locked.
    struct LockedKey {
        inner: SqliteStorage,
        key: &'static str,
    }

    impl Storage for LockedKey {
        fn tables(&self) -> crate::Result<Vec<String>> {
            self.inner.tables()
        }

        fn columns(&self, table: &str) -> crate::Result<Vec<String>> {
            self.inner.columns(table)
        }

        fn schema_objects(&self, table: &str) -> crate::Result<Vec<String>> {
            self.inner.schema_objects(table)
        }

        fn execute(&mut self, sql: &str) -> crate::Result<()> {
            self.inner.execute(sql)
        }

        fn execute_in_transaction(&mut self, statements: &[&str]) -> crate::Result<()> {
            self.inner.execute_in_transaction(statements)
        }

        fn query_value(&self, sql: &str, param: &str) -> crate::Result<Option<StoredValue>> {
            if param == self.key {
                return Err(StorageError::Unavailable("database table is locked".to_string()).into());
            }
            self.inner.query_value(sql, param)
        }
    }

    fn storage_with(rows: &str) -> SqliteStorage {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage
            .execute("CREATE TABLE settings (key TEXT, value)")
            .unwrap();
        if !rows.is_empty() {
            storage
                .execute(&format!("INSERT INTO settings (key, value) VALUES {rows}"))
                .unwrap();
        }
        storage
    }

    #[test]
    fn test_decimal_integer_falls_back_to_rounding() {
        let mut storage = storage_with("('result_view_duration', '4.0')");
        let mut sink = RecordingSink::default();

        let report = migrate_settings(&mut storage, &mut sink);

        assert_eq!(
            sink.calls,
            vec![(SettingKey::ResultViewDuration, SettingValue::Int(4))]
        );
        assert_eq!(report.applied, vec!["result_view_duration"]);
        assert!(report.table_dropped);
        assert!(!storage.has_table("settings").unwrap());
    }

    #[test]
    fn test_unparseable_value_skips_only_that_key() {
        let mut storage = storage_with("('history_size', 'lots'), ('sound', 1), ('other', 'x')");
        let mut sink = RecordingSink::default();

        let report = migrate_settings(&mut storage, &mut sink);

        assert_eq!(sink.calls, vec![(SettingKey::Sound, SettingValue::Bool(true))]);
        let skipped = report
            .skipped
            .iter()
            .find(|s| s.key == "history_size")
            .unwrap();
        assert!(matches!(skipped.reason, SkipReason::Unconvertible { .. }));
        assert!(report.table_dropped);
    }

    #[test]
    fn test_empty_table_is_dropped() {
        let mut storage = storage_with("");
        let mut sink = RecordingSink::default();

        let report = migrate_settings(&mut storage, &mut sink);

        assert!(sink.calls.is_empty());
        assert_eq!(report.skipped.len(), LEGACY_SETTINGS.len());
        assert!(report
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::Missing));
        assert!(report.table_dropped);
    }

    #[test]
    fn test_null_and_blank_values_are_missing() {
        let mut storage = storage_with("('marker_color', NULL), ('scan_on_start', '  ')");
        let mut sink = RecordingSink::default();

        migrate_settings(&mut storage, &mut sink);

        assert!(sink.calls.is_empty());
    }

    #[test]
    fn test_malformed_table_is_still_dropped() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage
            .execute("CREATE TABLE settings (name TEXT, data TEXT)")
            .unwrap();
        let mut sink = RecordingSink::default();

        let report = migrate_settings(&mut storage, &mut sink);

        assert!(sink.calls.is_empty());
        assert!(!report.has_read_failures());
        assert!(report
            .skipped
            .iter()
            .all(|s| matches!(s.reason, SkipReason::Unreadable { .. })));
        assert!(report.table_dropped);
        assert!(!storage.has_table("settings").unwrap());
    }

    #[test]
    fn test_locked_lookup_keeps_table() {
        let mut storage = LockedKey {
            inner: storage_with("('sound', 1), ('history_size', 80)"),
            key: "history_size",
        };
        let mut sink = RecordingSink::default();

        let report = migrate_settings(&mut storage, &mut sink);

        assert!(report.has_read_failures());
        assert_eq!(sink.calls, vec![(SettingKey::Sound, SettingValue::Bool(true))]);
        assert_eq!(sink.flushes, 0);
        assert!(!report.table_dropped);
        assert!(storage.has_table("settings").unwrap());
    }

    #[test]
    fn test_flush_happens_before_drop() {
        let mut storage = storage_with("('history_size', 100)");
        let mut sink = RecordingSink {
            fail_flush: true,
            ..RecordingSink::default()
        };

        let report = migrate_settings(&mut storage, &mut sink);

        assert_eq!(sink.flushes, 1);
        assert!(report.persist_error.is_some());
        assert!(!report.table_dropped);
        assert_eq!(
            storage.query_value(SELECT_SETTING_SQL, "history_size").unwrap(),
            Some(StoredValue::Integer(100))
        );

        sink.fail_flush = false;
        let report = migrate_settings(&mut storage, &mut sink);
        assert!(report.persist_error.is_none());
        assert!(report.table_dropped);
    }

    #[test]
    fn test_blocked_drop_keeps_table_and_repeats_setters() {
        let mut storage = storage_with("('sound', 'false'), ('marker_color', '#00ff00')");
        storage
            .execute(
                "CREATE UNIQUE INDEX settings_key ON settings (key);
                 CREATE TABLE presets (key TEXT REFERENCES settings (key));
                 INSERT INTO presets VALUES ('sound');",
            )
            .unwrap();

        let mut first = RecordingSink::default();
        let report = migrate_settings(&mut storage, &mut first);
        assert!(!report.table_dropped);
        assert!(report.persist_error.is_none());
        assert!(storage.has_table("settings").unwrap());

        let mut second = RecordingSink::default();
        let report = migrate_settings(&mut storage, &mut second);
        assert!(!report.table_dropped);
        assert_eq!(second.calls, first.calls);
        assert_eq!(
            first.calls,
            vec![
                (SettingKey::Sound, SettingValue::Bool(false)),
                (SettingKey::MarkerColor, SettingValue::Text("#00ff00".to_string())),
            ]
        );
    }
}

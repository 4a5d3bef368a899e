//! Database schema definitions.
//!
//! There is no stored schema version. The version is read off the table
//! structure: which columns `history` has, and whether the legacy
//! `settings` table is still around. Every statement below is applied only
//! after checking the structural fact it changes.

/// Scan history table.
pub const HISTORY_TABLE: &str = "history";

/// Temporary table used while rebuilding [`HISTORY_TABLE`].
pub const HISTORY_TMP_TABLE: &str = "history_tmp";

/// Identity column, absent from the oldest databases.
pub const HISTORY_FIELD_ID: &str = "id";

/// Scanned payload.
pub const HISTORY_FIELD_VALUE: &str = "value";

/// Creation time.
pub const HISTORY_FIELD_TIMESTAMP: &str = "timestamp";

/// Payload encoding, absent from older databases.
pub const HISTORY_FIELD_FORMAT: &str = "format";

/// All columns of the current history table, in declaration order.
pub const HISTORY_COLUMNS: [&str; 4] = [
    HISTORY_FIELD_ID,
    HISTORY_FIELD_VALUE,
    HISTORY_FIELD_TIMESTAMP,
    HISTORY_FIELD_FORMAT,
];

/// Legacy key/value settings table.
pub const SETTINGS_TABLE: &str = "settings";

/// Creates the history table with the current schema.
pub const CREATE_HISTORY_SQL: &str = r"
CREATE TABLE history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    value TEXT,
    timestamp TEXT,
    format TEXT
)";

/// Adds the format column to a history table that predates it.
pub const ADD_FORMAT_SQL: &str = "ALTER TABLE history ADD COLUMN format TEXT DEFAULT ''";

/// Rebuild-and-swap that gives an existing history table its identity
/// column. `SQLite` cannot add a primary key to an existing table, so the
/// rows are copied into a new table which then takes the old one's name.
/// Identities are assigned in the original row order.
pub const REBUILD_HISTORY_SQL: [&str; 4] = [
    r"
CREATE TABLE history_tmp (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    value TEXT,
    timestamp TEXT,
    format TEXT
)",
    r"
INSERT INTO history_tmp (value, timestamp, format)
SELECT value, timestamp, format FROM history ORDER BY rowid",
    "DROP TABLE history",
    "ALTER TABLE history_tmp RENAME TO history",
];

/// Looks up one legacy setting.
pub const SELECT_SETTING_SQL: &str = "SELECT value FROM settings WHERE key = ?";

/// Retires the legacy settings table.
pub const DROP_SETTINGS_SQL: &str = "DROP TABLE IF EXISTS settings";

/// Lists the `CREATE` statements of indexes and triggers attached to a
/// table. Dropping the table drops these too, so a rebuild replays them.
pub const SCHEMA_OBJECTS_SQL: &str = r"
SELECT sql FROM sqlite_master
WHERE tbl_name = ? AND type IN ('index', 'trigger') AND sql IS NOT NULL
ORDER BY type, name";

/// Lists ordinary tables.
pub const LIST_TABLES_SQL: &str = r"
SELECT name FROM sqlite_master
WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
ORDER BY name";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_rebuild_agree() {
        let normalize = |sql: &str| sql.split_whitespace().collect::<Vec<_>>().join(" ");
        let create = normalize(CREATE_HISTORY_SQL);
        let tmp = normalize(REBUILD_HISTORY_SQL[0]);
        assert_eq!(create.replace(HISTORY_TABLE, HISTORY_TMP_TABLE), tmp);
    }

    #[test]
    fn test_rebuild_swaps_into_history() {
        assert!(REBUILD_HISTORY_SQL[2].contains(HISTORY_TABLE));
        assert!(REBUILD_HISTORY_SQL[3].ends_with(HISTORY_TABLE));
    }

    #[test]
    fn test_history_columns_declared() {
        for column in HISTORY_COLUMNS {
            assert!(CREATE_HISTORY_SQL.contains(column));
        }
    }
}

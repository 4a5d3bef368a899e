//! Structured settings and the migration of legacy settings rows.
//!
//! Settings used to live in a key/value `settings` table inside the history
//! database. They now belong to a structured store reached through
//! [`SettingsSink`]. The fixed list of legacy keys and the typed setter
//! each one feeds is declared once in [`LEGACY_SETTINGS`].

pub mod convert;
pub mod migrator;
pub mod store;

pub use migrator::{SettingsReport, SkipReason, SkippedSetting, migrate_settings};
pub use store::{Settings, SettingsFile};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    /// Boolean flag.
    Bool,
    /// 32-bit integer.
    Int,
    /// Free text.
    Text,
}

impl SettingKind {
    /// Returns the type name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Text => "text",
        }
    }
}

/// Keys of the structured settings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    /// Beep on a successful scan.
    Sound,
    /// Camera zoom factor.
    DigitalZoom,
    /// Seconds to keep scanning before giving up.
    ScanDuration,
    /// Seconds to show a result.
    ResultViewDuration,
    /// Colour of the viewfinder marker.
    MarkerColor,
    /// Maximum number of history rows to keep.
    HistorySize,
    /// Start scanning as soon as the app opens.
    ScanOnStart,
}

impl SettingKey {
    /// Every key, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Sound,
        Self::DigitalZoom,
        Self::ScanDuration,
        Self::ResultViewDuration,
        Self::MarkerColor,
        Self::HistorySize,
        Self::ScanOnStart,
    ];

    /// Returns the key's stable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sound => "sound",
            Self::DigitalZoom => "digital_zoom",
            Self::ScanDuration => "scan_duration",
            Self::ResultViewDuration => "result_view_duration",
            Self::MarkerColor => "marker_color",
            Self::HistorySize => "history_size",
            Self::ScanOnStart => "scan_on_start",
        }
    }

    /// Returns the value type the key holds.
    #[must_use]
    pub const fn kind(self) -> SettingKind {
        match self {
            Self::Sound | Self::ScanOnStart => SettingKind::Bool,
            Self::DigitalZoom | Self::ScanDuration | Self::ResultViewDuration | Self::HistorySize => {
                SettingKind::Int
            }
            Self::MarkerColor => SettingKind::Text,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i32),
    /// Text value.
    Text(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Destination of migrated settings.
///
/// One typed setter per value kind, scoped by key. Implementations decide
/// how values are persisted; [`flush`](SettingsSink::flush) must not return
/// until they are durable.
pub trait SettingsSink {
    /// Stores a boolean setting.
    fn set_bool(&mut self, key: SettingKey, value: bool);

    /// Stores an integer setting.
    fn set_int(&mut self, key: SettingKey, value: i32);

    /// Stores a text setting.
    fn set_text(&mut self, key: SettingKey, value: String);

    /// Persists values set so far.
    ///
    /// Called once after migration and before the legacy table is dropped.
    /// The default does nothing, for sinks that hold values in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the values could not be written.
    fn flush(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

/// One row of the legacy settings table this crate knows how to migrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacySetting {
    /// Key as stored in the legacy table.
    pub key: &'static str,
    /// Structured key receiving the value.
    pub target: SettingKey,
}

impl LegacySetting {
    const fn new(key: &'static str, target: SettingKey) -> Self {
        Self { key, target }
    }

    /// Returns the type the legacy value is converted to.
    #[must_use]
    pub const fn kind(&self) -> SettingKind {
        self.target.kind()
    }
}

/// Legacy keys and where they go. Keys are independent of each other.
pub const LEGACY_SETTINGS: [LegacySetting; 7] = [
    LegacySetting::new("sound", SettingKey::Sound),
    LegacySetting::new("digital_zoom", SettingKey::DigitalZoom),
    LegacySetting::new("scan_duration", SettingKey::ScanDuration),
    LegacySetting::new("result_view_duration", SettingKey::ResultViewDuration),
    LegacySetting::new("marker_color", SettingKey::MarkerColor),
    LegacySetting::new("history_size", SettingKey::HistorySize),
    LegacySetting::new("scan_on_start", SettingKey::ScanOnStart),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_key_has_one_legacy_source() {
        let targets: HashSet<_> = LEGACY_SETTINGS.iter().map(|s| s.target).collect();
        assert_eq!(targets.len(), SettingKey::ALL.len());

        let keys: HashSet<_> = LEGACY_SETTINGS.iter().map(|s| s.key).collect();
        assert_eq!(keys.len(), LEGACY_SETTINGS.len());
    }

    #[test]
    fn test_legacy_kinds() {
        let kind = |key: &str| {
            LEGACY_SETTINGS
                .iter()
                .find(|s| s.key == key)
                .map(LegacySetting::kind)
        };
        assert_eq!(kind("sound"), Some(SettingKind::Bool));
        assert_eq!(kind("result_view_duration"), Some(SettingKind::Int));
        assert_eq!(kind("marker_color"), Some(SettingKind::Text));
        assert_eq!(kind("unknown"), None);
    }

    #[test]
    fn test_key_names_match_serde() {
        for key in SettingKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.name()));
        }
    }

    #[test]
    fn test_setting_value_display() {
        assert_eq!(SettingValue::Bool(true).to_string(), "true");
        assert_eq!(SettingValue::Int(4).to_string(), "4");
        assert_eq!(SettingValue::Text("#fff".into()).to_string(), "#fff");
    }
}

//! Structured settings store.
//!
//! [`Settings`] is the typed settings record; [`SettingsFile`] persists it
//! as JSON. Both accept migrated values through [`SettingsSink`].

use crate::error::{IoError, Result, SettingsError};
use crate::settings::{SettingKey, SettingValue, SettingsSink};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default settings file name under the storage root.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Typed application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Beep on a successful scan.
    pub sound: bool,
    /// Camera zoom factor.
    pub digital_zoom: i32,
    /// Seconds to keep scanning before giving up.
    pub scan_duration: i32,
    /// Seconds to show a result.
    pub result_view_duration: i32,
    /// Colour of the viewfinder marker.
    pub marker_color: String,
    /// Maximum number of history rows to keep.
    pub history_size: i32,
    /// Start scanning as soon as the app opens.
    pub scan_on_start: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound: false,
            digital_zoom: 3,
            scan_duration: 20,
            result_view_duration: 4,
            marker_color: "#66b2ff".to_string(),
            history_size: 50,
            scan_on_start: false,
        }
    }
}

impl Settings {
    /// Returns the current value of `key`.
    #[must_use]
    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::Sound => SettingValue::Bool(self.sound),
            SettingKey::DigitalZoom => SettingValue::Int(self.digital_zoom),
            SettingKey::ScanDuration => SettingValue::Int(self.scan_duration),
            SettingKey::ResultViewDuration => SettingValue::Int(self.result_view_duration),
            SettingKey::MarkerColor => SettingValue::Text(self.marker_color.clone()),
            SettingKey::HistorySize => SettingValue::Int(self.history_size),
            SettingKey::ScanOnStart => SettingValue::Bool(self.scan_on_start),
        }
    }
}

impl SettingsSink for Settings {
    fn set_bool(&mut self, key: SettingKey, value: bool) {
        match key {
            SettingKey::Sound => self.sound = value,
            SettingKey::ScanOnStart => self.scan_on_start = value,
            _ => warn!("{key} is not a boolean setting"),
        }
    }

    fn set_int(&mut self, key: SettingKey, value: i32) {
        match key {
            SettingKey::DigitalZoom => self.digital_zoom = value,
            SettingKey::ScanDuration => self.scan_duration = value,
            SettingKey::ResultViewDuration => self.result_view_duration = value,
            SettingKey::HistorySize => self.history_size = value,
            _ => warn!("{key} is not an integer setting"),
        }
    }

    fn set_text(&mut self, key: SettingKey, value: String) {
        match key {
            SettingKey::MarkerColor => self.marker_color = value,
            _ => warn!("{key} is not a text setting"),
        }
    }
}

/// Settings persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
    settings: Settings,
    dirty: bool,
}

impl SettingsFile {
    /// Loads settings from `path`, using defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but can't be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let settings = if path.exists() {
            let json = std::fs::read_to_string(&path).map_err(|e| IoError::ReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            serde_json::from_str::<Settings>(&json).map_err(SettingsError::from)?
        } else {
            debug!("{} not found, using defaults", path.display());
            Settings::default()
        };

        Ok(Self {
            path,
            settings,
            dirty: false,
        })
    }

    /// Returns the file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns true if values changed since loading or the last save.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the settings to disk, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file can't be written.
    pub fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| IoError::DirectoryFailed {
                    path: parent.display().to_string(),
                    reason: e.to_string(),
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(SettingsError::from)?;
        std::fs::write(&self.path, json).map_err(|e| IoError::WriteFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.dirty = false;
        Ok(())
    }
}

impl SettingsSink for SettingsFile {
    fn set_bool(&mut self, key: SettingKey, value: bool) {
        self.settings.set_bool(key, value);
        self.dirty = true;
    }

    fn set_int(&mut self, key: SettingKey, value: i32) {
        self.settings.set_int(key, value);
        self.dirty = true;
    }

    fn set_text(&mut self, key: SettingKey, value: String) {
        self.settings.set_text(key, value);
        self.dirty = true;
    }

    fn flush(&mut self) -> Result<()> {
        if self.dirty {
            self.save()?;
            debug!("settings written to {}", self.path.display());
        }
        Ok(())
    }
}

//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::database::StartupReport;
use crate::location::StorageLocation;
use crate::settings::{SettingKey, Settings};
use crate::storage::{HistoryRecord, SchemaState};
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Read-only view of a database for the `status` command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    /// Resolved locations.
    pub location: StorageLocation,
    /// Whether the database file exists.
    pub exists: bool,
    /// Structural schema state, if the file could be inspected.
    pub state: Option<SchemaState>,
    /// Number of history rows, if the table exists.
    pub history_count: Option<usize>,
}

/// Formats resolved locations.
#[must_use]
pub fn format_paths(location: &StorageLocation, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "Database:  {}", location.database_path.display());
            let _ = writeln!(output, "Assets:    {}", location.asset_dir.display());
            output
        }
        OutputFormat::Json => format_json(location),
    }
}

/// Formats the outcome of a startup pass.
#[must_use]
pub fn format_startup(
    location: &StorageLocation,
    report: &StartupReport,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => format_startup_text(location, report),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Startup<'a> {
                location: &'a StorageLocation,
                report: &'a StartupReport,
                clean: bool,
            }
            format_json(&Startup {
                location,
                report,
                clean: report.is_clean(),
            })
        }
    }
}

fn format_startup_text(location: &StorageLocation, report: &StartupReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Database: {}", location.database_path.display());

    if let Some(error) = &report.open_error {
        let _ = writeln!(output, "  Open failed: {error}");
        return output;
    }

    if let Some(upgrade) = &report.upgrade {
        if upgrade.is_noop() {
            output.push_str("  Schema:   up to date\n");
        }
        for step in &upgrade.applied {
            let _ = writeln!(output, "  Applied:  {step}");
        }
        for failure in &upgrade.failed {
            let _ = writeln!(output, "  Failed:   {} ({})", failure.step, failure.error);
        }
    }

    if let Some(settings) = &report.settings {
        let _ = writeln!(
            output,
            "  Settings: {} migrated, {} skipped, legacy table {}",
            settings.applied.len(),
            settings.skipped.len(),
            if settings.table_dropped {
                "dropped"
            } else {
                "kept"
            }
        );
        if let Some(error) = &settings.persist_error {
            let _ = writeln!(output, "  Failed:   save settings ({error})");
        }
    }

    output
}

/// Formats the read-only status view.
#[must_use]
pub fn format_status(status: &StatusInfo, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_status_text(status),
        OutputFormat::Json => format_json(status),
    }
}

fn format_status_text(status: &StatusInfo) -> String {
    let mut output = String::new();
    output.push_str("scanstore Status\n");
    output.push_str("================\n\n");
    let _ = writeln!(
        output,
        "  Database:        {}",
        status.location.database_path.display()
    );
    if !status.exists {
        output.push_str("  State:           not created\n");
        return output;
    }

    if let Some(state) = &status.state {
        let columns = state
            .history_columns
            .as_ref()
            .map_or_else(|| "-".to_string(), |c| c.join(", "));
        let _ = writeln!(output, "  History columns: {columns}");
        let _ = writeln!(
            output,
            "  Legacy settings: {}",
            if state.legacy_settings { "present" } else { "absent" }
        );
        let _ = writeln!(
            output,
            "  Schema:          {}",
            if state.is_current() { "current" } else { "needs upgrade" }
        );
    }
    if let Some(count) = status.history_count {
        let _ = writeln!(output, "  History rows:    {count}");
    }
    output
}

/// Formats a list of history records.
#[must_use]
pub fn format_history(records: &[HistoryRecord], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_history_text(records),
        OutputFormat::Json => format_json(&records),
    }
}

fn format_history_text(records: &[HistoryRecord]) -> String {
    if records.is_empty() {
        return "No history records.\n".to_string();
    }

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<6} {:<20} {:<12} Value",
        "ID", "Timestamp", "Format"
    );
    output.push_str(&"-".repeat(70));
    output.push('\n');

    for record in records {
        let _ = writeln!(
            output,
            "{:<6} {:<20} {:<12} {}",
            record.id,
            truncate(record.timestamp.as_deref().unwrap_or("-"), 20),
            truncate(record.format_or_empty(), 12),
            truncate(record.value.as_deref().unwrap_or("-"), 40)
        );
    }

    output
}

/// Formats structured settings.
#[must_use]
pub fn format_settings(settings: &Settings, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for key in SettingKey::ALL {
                let _ = writeln!(output, "{:<22} {}", key.name(), settings.get(key));
            }
            output
        }
        OutputFormat::Json => format_json(settings),
    }
}

/// Formats an error for output.
#[must_use]
pub fn format_error(error: &crate::Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }
            format_json(&ErrorOutput {
                error: error.to_string(),
            })
        }
    }
}

fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Truncates a string to `max_chars` characters with ellipsis.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 3 {
        s.chars().take(max_chars).collect()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{head}...")
    }
}

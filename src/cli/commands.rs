//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::cli::output::{
    OutputFormat, StatusInfo, format_history, format_paths, format_settings, format_startup,
    format_status,
};
use crate::cli::parser::{Cli, Commands};
use crate::database::Database;
use crate::error::Result;
use crate::location::StorageLocation;
use crate::settings::SettingsFile;
use crate::storage::{SchemaState, SqliteStorage};
use std::path::Path;
use tracing::info;

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let root = cli.get_root()?;

    match &cli.command {
        Commands::Init => cmd_init(&root, &cli.get_settings_path(&root), format),
        Commands::Paths => Ok(format_paths(&StorageLocation::new(&root), format)),
        Commands::Status => cmd_status(&root, format),
        Commands::History { limit } => cmd_history(&root, *limit, format),
        Commands::Settings => cmd_settings(&cli.get_settings_path(&root), format),
    }
}

fn cmd_init(root: &Path, settings_path: &Path, format: OutputFormat) -> Result<String> {
    let mut settings = SettingsFile::load(settings_path)?;
    let db = Database::initialize(root, &mut settings);

    if settings.is_dirty() {
        settings.save()?;
        info!("settings written to {}", settings.path().display());
    }

    Ok(format_startup(db.location(), db.report(), format))
}

fn cmd_status(root: &Path, format: OutputFormat) -> Result<String> {
    let location = StorageLocation::new(root);
    let exists = location.database_path.is_file();

    let (state, history_count) = if exists {
        let storage = SqliteStorage::open_read_only(&location.database_path)?;
        let state = SchemaState::inspect(&storage)?;
        let count = if state.has_history() {
            Some(storage.history_count()?)
        } else {
            None
        };
        (Some(state), count)
    } else {
        (None, None)
    };

    let status = StatusInfo {
        location,
        exists,
        state,
        history_count,
    };
    Ok(format_status(&status, format))
}

fn cmd_history(root: &Path, limit: Option<usize>, format: OutputFormat) -> Result<String> {
    let location = StorageLocation::new(root);
    let storage = SqliteStorage::open_read_only(&location.database_path)?;
    let mut records = storage.history_records()?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    Ok(format_history(&records, format))
}

fn cmd_settings(settings_path: &Path, format: OutputFormat) -> Result<String> {
    let settings = SettingsFile::load(settings_path)?;
    Ok(format_settings(settings.settings(), format))
}

//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::error::{Error, Result};
use crate::settings::store::SETTINGS_FILE_NAME;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Application directory name under the platform data directory.
pub const APP_DIR_NAME: &str = "scanstore";

/// scanstore: scan history database upgrade and settings migration.
///
/// Brings the scan history database under a storage root to the current
/// schema and moves legacy settings into the settings file.
#[derive(Parser, Debug)]
#[command(name = "scanstore")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Application storage root.
    ///
    /// Defaults to `scanstore` under the platform's local data directory.
    #[arg(short, long, env = "SCANSTORE_ROOT", global = true)]
    pub root: Option<PathBuf>,

    /// Settings file.
    ///
    /// Defaults to `settings.json` under the storage root.
    #[arg(long, env = "SCANSTORE_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the startup sequence: create or upgrade the database and migrate
    /// legacy settings.
    Init,

    /// Show the database path and asset directory.
    Paths,

    /// Show the schema state without changing anything.
    Status,

    /// List history records.
    History {
        /// Show at most this many records.
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show the structured settings.
    Settings,
}

impl Cli {
    /// Returns the storage root, using the platform default if not given.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no root was given and the platform
    /// has no local data directory.
    pub fn get_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config {
                message: "no local data directory; pass --root".to_string(),
            })
    }

    /// Returns the settings file path for `root`.
    #[must_use]
    pub fn get_settings_path(&self, root: &Path) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(|| root.join(SETTINGS_FILE_NAME))
    }
}

//! Database location resolution.
//!
//! The database file name follows the naming scheme of the `LocalStorage`
//! plugin that originally created it: the hex MD5 digest of the logical
//! database name plus a `.sqlite` extension, inside a `Databases`
//! directory under the application's storage root. Reproducing it exactly
//! means an existing database is found rather than orphaned.

use md5::{Digest, Md5};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Logical name of the scan history database.
pub const DATABASE_NAME: &str = "CodeReader";

/// Directory under the storage root holding database files.
pub const DATABASES_DIR: &str = "Databases";

/// Directory under [`DATABASES_DIR`] reserved for saved images.
pub const ASSET_DIR: &str = "images";

/// Extension appended to the hashed database name.
pub const DATABASE_EXTENSION: &str = "sqlite";

/// Resolved on-disk locations. Computed once at startup and passed to
/// whoever needs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageLocation {
    /// Directory holding the database file.
    pub base_dir: PathBuf,
    /// Absolute path of the database file.
    pub database_path: PathBuf,
    /// Directory for auxiliary binary assets. Not created here.
    pub asset_dir: PathBuf,
}

impl StorageLocation {
    /// Computes locations under `storage_root` without touching the disk.
    #[must_use]
    pub fn new(storage_root: &Path) -> Self {
        let base_dir = storage_root.join(DATABASES_DIR);
        let database_path = base_dir.join(database_file_name(DATABASE_NAME));
        let asset_dir = base_dir.join(ASSET_DIR);
        Self {
            base_dir,
            database_path,
            asset_dir,
        }
    }

    /// Computes locations under `storage_root` and ensures the base directory
    /// exists.
    ///
    /// A directory creation failure is logged and otherwise ignored; opening
    /// the database will fail later instead.
    #[must_use]
    pub fn resolve(storage_root: &Path) -> Self {
        let location = Self::new(storage_root);
        if !location.base_dir.is_dir() {
            if let Err(e) = std::fs::create_dir_all(&location.base_dir) {
                warn!(
                    "failed to create {}: {e}",
                    location.base_dir.display()
                );
            }
        }
        debug!("database path: {}", location.database_path.display());
        location
    }
}

/// Returns the file name used for the database with the given logical name.
///
/// # Examples
///
/// ```
/// use scanstore::location::database_file_name;
///
/// assert_eq!(
///     database_file_name("CodeReader"),
///     "5dbbf8b4fe9fd37bc8d88c422266ef7b.sqlite"
/// );
/// ```
#[must_use]
pub fn database_file_name(name: &str) -> String {
    let digest = Md5::digest(name.as_bytes());
    format!("{}.{DATABASE_EXTENSION}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_database_file_name_matches_local_storage() {
        assert_eq!(
            database_file_name(DATABASE_NAME),
            "5dbbf8b4fe9fd37bc8d88c422266ef7b.sqlite"
        );
    }

    #[test]
    fn test_database_file_name_is_lowercase_hex() {
        let name = database_file_name("anything");
        let stem = name.trim_end_matches(".sqlite");
        assert_eq!(stem.len(), 32);
        assert!(stem.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_new_layout() {
        let location = StorageLocation::new(Path::new("/data/app"));
        assert_eq!(location.base_dir, PathBuf::from("/data/app/Databases"));
        assert_eq!(
            location.database_path,
            PathBuf::from("/data/app/Databases/5dbbf8b4fe9fd37bc8d88c422266ef7b.sqlite")
        );
        assert_eq!(
            location.asset_dir,
            PathBuf::from("/data/app/Databases/images")
        );
    }

    #[test]
    fn test_resolve_creates_base_dir_only() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("root");

        let location = StorageLocation::resolve(&root);

        assert!(location.base_dir.is_dir());
        assert!(!location.asset_dir.exists());
        assert!(!location.database_path.exists());
    }

    #[test]
    fn test_resolve_tolerates_unwritable_root() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let location = StorageLocation::resolve(&blocker);
        assert!(!location.base_dir.exists());
    }
}

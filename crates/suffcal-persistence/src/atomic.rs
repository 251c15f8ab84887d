//! Atomic file operations for crash-safe photo storage.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::error::{PersistenceError, Result};

/// A private scratch directory for one in-flight download.
///
/// The directory and anything left in it are removed when the value is
/// dropped, so an aborted download never reaches the photo areas.
#[derive(Debug)]
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    /// Creates a fresh scratch directory inside `staging_root`.
    pub fn create_in(staging_root: &Path) -> Result<Self> {
        ensure_dir(staging_root)?;
        let dir = tempfile::Builder::new()
            .prefix("download-")
            .tempdir_in(staging_root)
            .map_err(|source| PersistenceError::DirectoryError {
                path: staging_root.to_path_buf(),
                source,
            })?;
        Ok(Self { dir })
    }

    /// Returns the scratch directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Creates a directory and its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|source| PersistenceError::DirectoryError {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Moves a file with a single rename.
///
/// Both paths must be on the same file system; the photo areas and the
/// staging directory share the storage root for that reason.
pub fn atomic_move(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|source| PersistenceError::WriteError {
        path: to.to_path_buf(),
        source,
    })
}

/// Empties a directory, recreating it if necessary.
pub fn reset_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
    }
    ensure_dir(path)
}

//! Local persistence for the trip ledger, accounting state, and event logs.
//!
//! Everything lives in one data directory:
//!
//! ```text
//! <root>/
//!   ledger.json       # Trip ledger, replaced atomically on every commit
//!   accounting.json   # Refill window cursor and per-driver usage, replaced atomically
//!   drivers.toml      # Driver registry (read-only)
//!   failures.csv      # Append-only failure log
//!   refills.csv       # Append-only refill event log
//! ```
//!
//! Files that are rewritten are never written in place: the new contents go
//! to a sibling `.tmp` file which is synced and then renamed over the
//! canonical path. A crash at any point leaves either the old or the new
//! file, never a mix.

mod accounting;
mod drivers;
mod failures;
mod ledger;
mod refills;
mod rows;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

// Trait must be in scope for `.write_all()` on `File`.
use io::Write;

use crate::model::LedgerError;

pub use failures::FailureLog;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no ledger at {0}")]
    LedgerMissing(PathBuf),

    #[error("corrupt {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("ledger rejected update: {0}")]
    Ledger(#[from] LedgerError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Local file-based storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the default storage root: `~/.fueltrack/data/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".fueltrack").join("data"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// New file contents written beside their destination but not yet visible there.
///
/// Dropping a staged write without publishing it leaves the destination untouched.
#[derive(Debug)]
pub(crate) struct StagedWrite {
    staged: PathBuf,
    target: PathBuf,
}

impl StagedWrite {
    /// Writes and syncs `contents` to `<target>.tmp`.
    pub(crate) fn stage(target: &Path, contents: &[u8]) -> io::Result<Self> {
        let mut name = target.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        let staged = target.with_file_name(name);

        let mut file = fs::File::create(&staged)?;
        file.write_all(contents)?;
        file.sync_all()?;

        Ok(Self {
            staged,
            target: target.to_path_buf(),
        })
    }

    /// Atomically replaces the destination with the staged contents.
    pub(crate) fn publish(self) -> io::Result<()> {
        fs::rename(&self.staged, &self.target)?;
        sync_parent(&self.target);
        Ok(())
    }
}

/// Replaces `target` with `contents` so that readers see either the old or the new file.
pub(crate) fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    StagedWrite::stage(target, contents)?.publish()
}

/// Persists the rename itself. Best effort: not every platform can open a directory.
fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = fs::File::open(parent)
    {
        let _ = dir.sync_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn new_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("data");
        let storage = Storage::new(&root).unwrap();

        assert!(root.is_dir());
        assert_eq!(storage.root(), root.as_path());
    }

    #[test]
    fn write_atomic_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn unpublished_stage_leaves_target_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        write_atomic(&path, b"committed").unwrap();

        let staged = StagedWrite::stage(&path, b"half-done").unwrap();
        drop(staged);

        assert_eq!(fs::read(&path).unwrap(), b"committed");
    }
}

//! Log directory management.
//!
//! A log directory holds pairs of segment files named by their zero-padded
//! decimal base offset, plus an advisory lock file:
//!
//! ```text
//! <log_dir>/
//! ├─ LOCK                           # advisory lock for single-writer
//! ├─ 00000000000000000000.store     # record bytes
//! ├─ 00000000000000000000.index     # offset-to-position entries
//! ├─ 00000000000000000017.store
//! └─ 00000000000000000017.index
//! ```
//!
//! Base offsets are padded to 20 digits so lexicographic file order equals
//! numeric base-offset order. The LOCK file ensures only one log instance
//! appends to a directory at a time.

use crate::error::{LogError, LogResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::warn;

const LOCK_FILE: &str = "LOCK";
const STORE_EXT: &str = "store";
const INDEX_EXT: &str = "index";

/// A log directory with its advisory lock held.
///
/// Only one `LogDir` instance can exist per directory at a time; the lock
/// is released when the value is dropped.
#[derive(Debug)]
pub(crate) struct LogDir {
    path: PathBuf,
    /// Lock file handle, held for exclusive access.
    _lock_file: File,
}

impl LogDir {
    /// Opens a log directory, creating it if needed, and takes the lock.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Locked`] if another live log holds the lock, or
    /// an I/O error if the directory or lock file cannot be created.
    pub(crate) fn open(path: &Path) -> LogResult<Self> {
        fs::create_dir_all(path)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(LogError::Locked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the directory path.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the store file path for a base offset.
    pub(crate) fn store_path(&self, base_offset: u64) -> PathBuf {
        self.path.join(format!("{base_offset:020}.{STORE_EXT}"))
    }

    /// Returns the index file path for a base offset.
    pub(crate) fn index_path(&self, base_offset: u64) -> PathBuf {
        self.path.join(format!("{base_offset:020}.{INDEX_EXT}"))
    }

    /// Scans the directory for segment files and returns their base
    /// offsets, sorted ascending and deduplicated.
    ///
    /// Each base appears twice on disk (`.store` and `.index`), hence the
    /// dedup. Files with other extensions (such as `LOCK`) are ignored;
    /// files with a segment extension but a non-numeric stem are skipped
    /// with a warning.
    pub(crate) fn base_offsets(&self) -> LogResult<Vec<u64>> {
        let mut bases = Vec::new();

        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();

            let is_segment_file = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == STORE_EXT || ext == INDEX_EXT);
            if !is_segment_file {
                continue;
            }

            let stem = path.file_stem().and_then(|stem| stem.to_str());
            match stem.and_then(|stem| stem.parse::<u64>().ok()) {
                Some(base) => bases.push(base),
                None => warn!(path = %path.display(), "skipping unrecognized segment file"),
            }
        }

        bases.sort_unstable();
        bases.dedup();
        Ok(bases)
    }
}

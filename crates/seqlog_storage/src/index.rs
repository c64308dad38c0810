//! Memory-mapped offset index.

use crate::error::{StorageError, StorageResult};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Width of the relative record number field, in bytes.
pub const OFF_WIDTH: u64 = 4;
/// Width of the store position field, in bytes.
pub const POS_WIDTH: u64 = 8;
/// Width of one index entry, in bytes.
pub const ENTRY_WIDTH: u64 = OFF_WIDTH + POS_WIDTH;

/// A memory-mapped table of fixed-width index entries.
///
/// Each entry is `[u32 BE relative record number][u64 BE store position]`.
/// On open the file is grown to `max_bytes` so the mapping has room for
/// every future entry; writes are plain stores into the mapping. On
/// [`close`](Self::close) the file is truncated back to the written length,
/// which is how a reopen recovers the entry count: after a clean shutdown
/// the file length is exactly `ENTRY_WIDTH * entries`.
///
/// A crash between open and close leaves the file at its pre-sized length
/// with zeros past the written region; this type assumes clean shutdown and
/// does not scan for the last nonzero entry.
#[derive(Debug)]
pub struct Index {
    path: PathBuf,
    file: File,
    mmap: MmapMut,
    /// Written bytes; the next entry lands here.
    size: u64,
}

impl Index {
    /// Opens or creates an index file, pre-sizing it to `max_bytes`.
    ///
    /// The file length before pre-sizing becomes the written size, so a
    /// cleanly closed index resumes with its entries intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, resized, or mapped.
    pub fn open(path: &Path, max_bytes: u64) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let size = file.metadata()?.len();
        file.set_len(max_bytes)?;

        // Safety: the file handle is exclusively owned by this Index and
        // the mapping is dropped before the file is truncated on close.
        let mmap = unsafe { MmapOptions::new().map_mut(&file)? };

        Ok(Self {
            path: path.to_path_buf(),
            file,
            mmap,
            size,
        })
    }

    /// Appends an entry mapping `rel` to store position `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexFull`] when the mapping has no room for
    /// another entry; the caller rotates to a fresh segment in response.
    pub fn write(&mut self, rel: u32, pos: u64) -> StorageResult<()> {
        let at = self.size as usize;
        if self.mmap.len() < at + ENTRY_WIDTH as usize {
            return Err(StorageError::IndexFull {
                capacity: self.mmap.len() as u64,
            });
        }

        self.mmap[at..at + OFF_WIDTH as usize].copy_from_slice(&rel.to_be_bytes());
        self.mmap[at + OFF_WIDTH as usize..at + ENTRY_WIDTH as usize]
            .copy_from_slice(&pos.to_be_bytes());
        self.size += ENTRY_WIDTH;

        Ok(())
    }

    /// Reads the entry for relative record number `rel`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EntryOutOfRange`] if `rel` addresses an
    /// entry past the written region.
    pub fn read(&self, rel: u32) -> StorageResult<(u32, u64)> {
        let at = u64::from(rel) * ENTRY_WIDTH;
        if self.size < at + ENTRY_WIDTH {
            return Err(StorageError::EntryOutOfRange {
                rel,
                entries: self.entries(),
            });
        }

        let at = at as usize;
        let rel_bytes: [u8; OFF_WIDTH as usize] = self.mmap[at..at + OFF_WIDTH as usize]
            .try_into()
            .expect("slice is OFF_WIDTH bytes");
        let pos_bytes: [u8; POS_WIDTH as usize] = self.mmap
            [at + OFF_WIDTH as usize..at + ENTRY_WIDTH as usize]
            .try_into()
            .expect("slice is POS_WIDTH bytes");

        Ok((u32::from_be_bytes(rel_bytes), u64::from_be_bytes(pos_bytes)))
    }

    /// Reads the last written entry, or `None` if the index is empty.
    ///
    /// This is what a segment uses on open to recover its next offset.
    pub fn last(&self) -> StorageResult<Option<(u32, u64)>> {
        if self.size == 0 {
            return Ok(None);
        }
        let rel = (self.size / ENTRY_WIDTH - 1) as u32;
        self.read(rel).map(Some)
    }

    /// Returns whether no entries have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the written size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the number of written entries.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.size / ENTRY_WIDTH
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes the mapping, syncs the file, and truncates it to the
    /// written length.
    ///
    /// Truncating restores the `file length == ENTRY_WIDTH * entries`
    /// invariant that reopen relies on.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush, sync, or truncate fails.
    pub fn close(self) -> StorageResult<()> {
        let Self {
            file, mmap, size, ..
        } = self;

        mmap.flush()?;
        // The mapping must be gone before the file shrinks under it.
        drop(mmap);

        file.set_len(size)?;
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MAX_BYTES: u64 = 1024;

    #[test]
    fn open_presizes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0.index");

        let index = Index::open(&path, MAX_BYTES).unwrap();
        assert!(index.is_empty());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), MAX_BYTES);
    }

    #[test]
    fn write_and_read_entries() {
        let dir = tempdir().unwrap();
        let mut index = Index::open(&dir.path().join("0.index"), MAX_BYTES).unwrap();

        let entries = [(0u32, 0u64), (1, 10), (2, 30)];
        for (rel, pos) in entries {
            index.write(rel, pos).unwrap();
        }

        for (rel, pos) in entries {
            assert_eq!(index.read(rel).unwrap(), (rel, pos));
        }
        assert_eq!(index.entries(), 3);
    }

    #[test]
    fn read_empty_index_fails() {
        let dir = tempdir().unwrap();
        let index = Index::open(&dir.path().join("0.index"), MAX_BYTES).unwrap();

        let result = index.read(0);
        assert!(matches!(
            result,
            Err(StorageError::EntryOutOfRange { entries: 0, .. })
        ));
    }

    #[test]
    fn last_on_empty_index_is_none() {
        let dir = tempdir().unwrap();
        let index = Index::open(&dir.path().join("0.index"), MAX_BYTES).unwrap();
        assert_eq!(index.last().unwrap(), None);
    }

    #[test]
    fn last_returns_final_entry() {
        let dir = tempdir().unwrap();
        let mut index = Index::open(&dir.path().join("0.index"), MAX_BYTES).unwrap();

        index.write(0, 0).unwrap();
        index.write(1, 18).unwrap();

        assert_eq!(index.last().unwrap(), Some((1, 18)));
    }

    #[test]
    fn read_past_written_region_fails() {
        let dir = tempdir().unwrap();
        let mut index = Index::open(&dir.path().join("0.index"), MAX_BYTES).unwrap();
        index.write(0, 0).unwrap();

        let result = index.read(1);
        assert!(matches!(result, Err(StorageError::EntryOutOfRange { .. })));
    }

    #[test]
    fn write_fails_when_capacity_exhausted() {
        let dir = tempdir().unwrap();
        // Room for exactly two entries.
        let mut index = Index::open(&dir.path().join("0.index"), 2 * ENTRY_WIDTH).unwrap();

        index.write(0, 0).unwrap();
        index.write(1, 18).unwrap();

        let result = index.write(2, 36);
        assert!(matches!(result, Err(StorageError::IndexFull { .. })));
    }

    #[test]
    fn close_truncates_to_written_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0.index");

        let mut index = Index::open(&path, MAX_BYTES).unwrap();
        index.write(0, 0).unwrap();
        index.write(1, 18).unwrap();
        index.close().unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 2 * ENTRY_WIDTH);
    }

    #[test]
    fn reopen_recovers_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0.index");

        {
            let mut index = Index::open(&path, MAX_BYTES).unwrap();
            index.write(0, 0).unwrap();
            index.write(1, 18).unwrap();
            index.write(2, 36).unwrap();
            index.close().unwrap();
        }

        let index = Index::open(&path, MAX_BYTES).unwrap();
        assert_eq!(index.entries(), 3);
        assert_eq!(index.last().unwrap(), Some((2, 36)));
        assert_eq!(index.read(1).unwrap(), (1, 18));
    }
}

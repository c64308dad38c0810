//! Segment: one store paired with one index under a base offset.

use crate::config::Config;
use crate::dir::LogDir;
use crate::error::LogResult;
use crate::record::Record;
use seqlog_storage::{Index, Store};
use std::fs;
use std::sync::Arc;

/// A contiguous slice of the log: a store for record bytes and an index
/// mapping segment-relative record numbers to store positions.
///
/// The segment owns offset assignment within its range. `base_offset` is
/// the first offset it covers; `next_offset` is one past the highest
/// stored offset, so the half-open range `[base_offset, next_offset)` is
/// exactly the set of offsets it can serve.
///
/// Mutation is not internally synchronized; the owning log serializes
/// appends behind its write lock.
#[derive(Debug)]
pub(crate) struct Segment {
    store: Arc<Store>,
    index: Index,
    base_offset: u64,
    next_offset: u64,
    config: Config,
}

impl Segment {
    /// Opens or creates the segment files for `base_offset`.
    ///
    /// An existing index's last entry determines `next_offset`: the
    /// segment resumes at `base_offset + last_rel + 1`. An empty index
    /// means a fresh segment starting at `base_offset`.
    pub(crate) fn new(dir: &LogDir, base_offset: u64, config: Config) -> LogResult<Self> {
        let store = Arc::new(Store::open(&dir.store_path(base_offset))?);
        let index = Index::open(&dir.index_path(base_offset), config.max_index_bytes)?;

        let next_offset = match index.last()? {
            Some((last_rel, _)) => base_offset + u64::from(last_rel) + 1,
            None => base_offset,
        };

        Ok(Self {
            store,
            index,
            base_offset,
            next_offset,
            config,
        })
    }

    /// Appends a record value and returns the offset it was assigned.
    ///
    /// The store write happens before the index write. If the index write
    /// fails the appended store bytes dangle and `next_offset` does not
    /// advance; a reopen never observes them because recovery derives
    /// `next_offset` from the index tail alone.
    pub(crate) fn append(&mut self, value: &[u8]) -> LogResult<u64> {
        let offset = self.next_offset;
        let (_, pos) = self.store.append(value)?;
        self.index.write((offset - self.base_offset) as u32, pos)?;
        self.next_offset = offset + 1;
        Ok(offset)
    }

    /// Reads the record at an absolute offset.
    ///
    /// The caller must have routed the offset to this segment; a relative
    /// number past the index tail surfaces as a storage error.
    pub(crate) fn read(&self, offset: u64) -> LogResult<Record> {
        let (_, pos) = self.index.read((offset - self.base_offset) as u32)?;
        let value = self.store.read(pos)?;
        Ok(Record::new(value, offset))
    }

    /// Returns whether either size limit has been reached.
    ///
    /// Hitting either limit means the log should rotate to a new segment.
    pub(crate) fn is_maxed(&self) -> bool {
        self.store.size() >= self.config.max_store_bytes
            || self.index.size() >= self.config.max_index_bytes
    }

    /// Returns whether `offset` falls within this segment's range.
    pub(crate) fn contains(&self, offset: u64) -> bool {
        self.base_offset <= offset && offset < self.next_offset
    }

    pub(crate) fn base_offset(&self) -> u64 {
        self.base_offset
    }

    pub(crate) fn next_offset(&self) -> u64 {
        self.next_offset
    }

    pub(crate) fn store_bytes(&self) -> u64 {
        self.store.size()
    }

    pub(crate) fn index_entries(&self) -> u64 {
        self.index.entries()
    }

    /// Returns a shared handle to the store for byte-stream readers.
    pub(crate) fn store_handle(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }

    /// Closes the index and store.
    pub(crate) fn close(self) -> LogResult<()> {
        self.index.close()?;
        self.store.close()?;
        Ok(())
    }

    /// Closes the segment and deletes both files.
    pub(crate) fn remove(self) -> LogResult<()> {
        let store_path = self.store.path().to_path_buf();
        let index_path = self.index.path().to_path_buf();

        self.close()?;
        fs::remove_file(index_path)?;
        fs::remove_file(store_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqlog_storage::{StorageError, ENTRY_WIDTH, LEN_WIDTH};
    use tempfile::tempdir;

    const VALUE: &[u8] = b"hello world";

    fn small_config() -> Config {
        Config::new().max_store_bytes(1024).max_index_bytes(1024)
    }

    #[test]
    fn append_assigns_offsets_from_base() {
        let temp = tempdir().unwrap();
        let dir = LogDir::open(temp.path()).unwrap();
        let mut segment = Segment::new(&dir, 16, small_config()).unwrap();

        assert_eq!(segment.next_offset(), 16);

        for i in 0..3u64 {
            let offset = segment.append(VALUE).unwrap();
            assert_eq!(offset, 16 + i);

            let record = segment.read(offset).unwrap();
            assert_eq!(record.value, VALUE);
            assert_eq!(record.offset, offset);
        }
        assert_eq!(segment.next_offset(), 19);
    }

    #[test]
    fn contains_covers_half_open_range() {
        let temp = tempdir().unwrap();
        let dir = LogDir::open(temp.path()).unwrap();
        let mut segment = Segment::new(&dir, 10, small_config()).unwrap();

        segment.append(VALUE).unwrap();
        segment.append(VALUE).unwrap();

        assert!(!segment.contains(9));
        assert!(segment.contains(10));
        assert!(segment.contains(11));
        assert!(!segment.contains(12));
    }

    #[test]
    fn maxed_by_store_size() {
        let temp = tempdir().unwrap();
        let dir = LogDir::open(temp.path()).unwrap();

        let config = Config::new()
            .max_store_bytes(2 * (LEN_WIDTH + VALUE.len() as u64))
            .max_index_bytes(1024);
        let mut segment = Segment::new(&dir, 0, config).unwrap();

        assert!(!segment.is_maxed());
        segment.append(VALUE).unwrap();
        assert!(!segment.is_maxed());
        segment.append(VALUE).unwrap();
        assert!(segment.is_maxed());
    }

    #[test]
    fn maxed_by_index_size() {
        let temp = tempdir().unwrap();
        let dir = LogDir::open(temp.path()).unwrap();

        let config = Config::new()
            .max_store_bytes(1024)
            .max_index_bytes(3 * ENTRY_WIDTH);
        let mut segment = Segment::new(&dir, 0, config).unwrap();

        for _ in 0..3 {
            assert!(!segment.is_maxed());
            segment.append(VALUE).unwrap();
        }
        assert!(segment.is_maxed());
    }

    #[test]
    fn full_index_fails_append() {
        let temp = tempdir().unwrap();
        let dir = LogDir::open(temp.path()).unwrap();

        let config = Config::new()
            .max_store_bytes(1024)
            .max_index_bytes(ENTRY_WIDTH);
        let mut segment = Segment::new(&dir, 0, config).unwrap();

        segment.append(VALUE).unwrap();
        let result = segment.append(VALUE);
        assert!(matches!(
            result,
            Err(crate::LogError::Storage(StorageError::IndexFull { .. }))
        ));
        // The failed append must not advance the offset sequence.
        assert_eq!(segment.next_offset(), 1);
    }

    #[test]
    fn reopen_recovers_next_offset_from_index_tail() {
        let temp = tempdir().unwrap();
        let dir = LogDir::open(temp.path()).unwrap();

        {
            let mut segment = Segment::new(&dir, 5, small_config()).unwrap();
            for _ in 0..4 {
                segment.append(VALUE).unwrap();
            }
            segment.close().unwrap();
        }

        let mut segment = Segment::new(&dir, 5, small_config()).unwrap();
        assert_eq!(segment.next_offset(), 9);
        assert_eq!(segment.read(7).unwrap().value, VALUE);

        let offset = segment.append(VALUE).unwrap();
        assert_eq!(offset, 9);
    }

    #[test]
    fn remove_deletes_both_files() {
        let temp = tempdir().unwrap();
        let dir = LogDir::open(temp.path()).unwrap();

        let mut segment = Segment::new(&dir, 0, small_config()).unwrap();
        segment.append(VALUE).unwrap();

        let store_path = dir.store_path(0);
        let index_path = dir.index_path(0);
        assert!(store_path.exists());
        assert!(index_path.exists());

        segment.remove().unwrap();
        assert!(!store_path.exists());
        assert!(!index_path.exists());
    }
}

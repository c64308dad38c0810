//! Append-only record store.

use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Width of the length prefix framing each record, in bytes.
pub const LEN_WIDTH: u64 = 8;

/// An append-only file of length-framed records.
///
/// Each record is written as an 8-byte big-endian length followed by the
/// payload bytes. Appends go through a buffered writer to amortize
/// syscalls; every read flushes the writer first so readers always observe
/// previously appended records, including their own.
///
/// # Thread Safety
///
/// All operations are serialized by an internal mutex, so a `Store` can be
/// shared across threads behind an `Arc` without external locking.
///
/// # Example
///
/// ```no_run
/// use seqlog_storage::{Store, LEN_WIDTH};
/// use std::path::Path;
///
/// let store = Store::open(Path::new("0.store")).unwrap();
/// let (written, pos) = store.append(b"payload").unwrap();
/// assert_eq!(written, LEN_WIDTH + 7);
/// assert_eq!(store.read(pos).unwrap(), b"payload");
/// ```
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    inner: Mutex<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    /// Buffered append handle; the file is opened in append mode.
    writer: BufWriter<File>,
    /// Separate handle for positional reads.
    reader: File,
    /// Logical size: on-disk bytes plus bytes still sitting in the writer.
    size: u64,
}

impl Store {
    /// Opens or creates a store file at the given path.
    ///
    /// The current file length becomes the initial size, so appends to an
    /// existing store continue where the previous process left off.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let write_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let reader = OpenOptions::new().read(true).open(path)?;

        let size = write_file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(StoreInner {
                writer: BufWriter::new(write_file),
                reader,
                size,
            }),
        })
    }

    /// Appends a record to the store.
    ///
    /// Returns `(bytes_written, position)` where `bytes_written` includes
    /// the length prefix and `position` is where the record starts. The
    /// position is what gets handed to [`read`](Self::read) later.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the file fails.
    pub fn append(&self, payload: &[u8]) -> StorageResult<(u64, u64)> {
        let mut inner = self.inner.lock();

        let pos = inner.size;
        inner
            .writer
            .write_all(&(payload.len() as u64).to_be_bytes())?;
        inner.writer.write_all(payload)?;

        let written = LEN_WIDTH + payload.len() as u64;
        inner.size += written;

        Ok((written, pos))
    }

    /// Reads the record stored at `pos`.
    ///
    /// The buffered writer is flushed first so the read observes every
    /// preceding append.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`] if `pos` does not address a
    /// complete record, or an I/O error if reading fails.
    pub fn read(&self, pos: u64) -> StorageResult<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;

        let mut len_buf = [0u8; LEN_WIDTH as usize];
        inner.read_exact_at(&mut len_buf, pos)?;
        let len = u64::from_be_bytes(len_buf);

        let mut payload = vec![0u8; len as usize];
        inner.read_exact_at(&mut payload, pos + LEN_WIDTH)?;

        Ok(payload)
    }

    /// Reads up to `buf.len()` raw bytes starting at `pos`.
    ///
    /// Returns the number of bytes read, which is 0 once `pos` reaches the
    /// end of the store. Unlike [`read`](Self::read) this does not
    /// interpret record framing; it is the primitive the log's byte-stream
    /// reader is built on. The buffered writer is flushed first, so the
    /// visible end of the store is the flush point of this call.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing or reading fails.
    pub fn read_at(&self, buf: &mut [u8], pos: u64) -> StorageResult<usize> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;

        if pos >= inner.size {
            return Ok(0);
        }
        let n = buf.len().min((inner.size - pos) as usize);
        inner.read_exact_at(&mut buf[..n], pos)?;

        Ok(n)
    }

    /// Returns the logical size of the store in bytes.
    ///
    /// This counts buffered bytes that have not reached the disk yet.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes buffered writes and syncs the file to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or sync fails.
    pub fn close(&self) -> StorageResult<()> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;
        inner.writer.get_ref().sync_all()?;
        Ok(())
    }
}

impl StoreInner {
    /// Reads exactly `buf.len()` bytes at `pos`, bounds-checked against the
    /// logical size. The caller must have flushed the writer.
    fn read_exact_at(&mut self, buf: &mut [u8], pos: u64) -> StorageResult<()> {
        let len = buf.len() as u64;
        if pos.saturating_add(len) > self.size {
            return Err(StorageError::ReadPastEnd {
                pos,
                len,
                size: self.size,
            });
        }
        self.reader.seek(SeekFrom::Start(pos))?;
        self.reader.read_exact(buf)?;
        Ok(())
    }
}

//! The log: a directory of segments.

use crate::config::Config;
use crate::dir::LogDir;
use crate::error::{LogError, LogResult};
use crate::record::Record;
use crate::segment::Segment;
use parking_lot::RwLock;
use seqlog_storage::{StorageError, Store};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// An append-only, offset-indexed commit log backed by a directory of
/// segment files.
///
/// Records are opaque byte blobs addressed by a monotonically increasing
/// 64-bit offset. Appends go to the active (last) segment; when a segment
/// reaches its configured size limits the log rotates to a fresh one.
/// Reads are routed to whichever segment covers the requested offset.
///
/// # Thread Safety
///
/// The log is safe to share across threads behind an `Arc`. Reads take a
/// shared lock and run in parallel; appends and truncation take the
/// exclusive side.
///
/// # Example
///
/// ```no_run
/// use seqlog_core::{Config, Log};
///
/// let log = Log::open("/var/lib/seqlog", Config::default()).unwrap();
/// let offset = log.append(b"hello").unwrap();
/// assert_eq!(log.read(offset).unwrap().value, b"hello");
/// ```
#[derive(Debug)]
pub struct Log {
    config: Config,
    inner: RwLock<Inner>,
}

#[derive(Debug)]
struct Inner {
    dir: LogDir,
    /// Segments ordered by ascending base offset; never empty. The last
    /// one is active and receives all appends.
    segments: Vec<Segment>,
}

/// A point-in-time description of one segment, for inspection tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    /// First offset the segment covers.
    pub base_offset: u64,
    /// One past the highest stored offset.
    pub next_offset: u64,
    /// Store file size in bytes.
    pub store_bytes: u64,
    /// Number of index entries.
    pub index_entries: u64,
}

impl Log {
    /// Opens a log directory, reconstructing segments from the files found
    /// there.
    ///
    /// Zero size limits in `config` are replaced with the 1 KiB defaults.
    /// Base offsets are recovered from the segment file names; each
    /// segment then recovers its next offset from its index tail. A
    /// directory with no segment files gets a fresh segment based at
    /// `config.initial_offset`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Locked`] if another live log has the directory
    /// open, or an error if any segment fails to open.
    pub fn open(dir: impl AsRef<Path>, config: Config) -> LogResult<Self> {
        let config = config.normalized();
        let dir = LogDir::open(dir.as_ref())?;

        let mut segments = Vec::new();
        for base_offset in dir.base_offsets()? {
            segments.push(Segment::new(&dir, base_offset, config)?);
        }
        if segments.is_empty() {
            segments.push(Segment::new(&dir, config.initial_offset, config)?);
        }

        Ok(Self {
            config,
            inner: RwLock::new(Inner { dir, segments }),
        })
    }

    /// Appends a record value and returns the offset it was assigned.
    ///
    /// Offsets increase by exactly one per successful append. If the
    /// append fills the active segment past either size limit, the log
    /// rotates so the next append starts a fresh segment. An active index
    /// that turns out to be full mid-append also forces a rotation, and
    /// the append is retried on the new segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment files cannot be written or a
    /// rotation fails.
    pub fn append(&self, value: &[u8]) -> LogResult<u64> {
        let mut inner = self.inner.write();

        let offset = match inner.active_mut().append(value) {
            Ok(offset) => offset,
            Err(LogError::Storage(StorageError::IndexFull { .. })) => {
                // The capacity check lost to a capacity that is not a
                // multiple of the entry width; rotate and retry once.
                let base_offset = inner.active().next_offset();
                inner.rotate(base_offset, self.config)?;
                inner.active_mut().append(value)?
            }
            Err(e) => return Err(e),
        };

        if inner.active().is_maxed() {
            inner.rotate(offset + 1, self.config)?;
        }

        Ok(offset)
    }

    /// Reads the record at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::OffsetOutOfRange`] if no segment covers the
    /// offset: it is below the lowest retained offset, above the highest
    /// assigned one, or inside a truncated range.
    pub fn read(&self, offset: u64) -> LogResult<Record> {
        let inner = self.inner.read();

        // The lock stays held across the scan and the delegated read.
        match inner.segments.iter().find(|s| s.contains(offset)) {
            Some(segment) => segment.read(offset),
            None => Err(LogError::OffsetOutOfRange { offset }),
        }
    }

    /// Returns the lowest offset still retained by the log.
    #[must_use]
    pub fn lowest_offset(&self) -> u64 {
        self.inner.read().first().base_offset()
    }

    /// Returns the highest offset assigned so far, or 0 for a log that
    /// has never been appended to.
    #[must_use]
    pub fn highest_offset(&self) -> u64 {
        let next_offset = self.inner.read().active().next_offset();
        match next_offset {
            0 => 0,
            n => n - 1,
        }
    }

    /// Removes every segment whose entire range lies at or below `up_to`,
    /// deleting its files.
    ///
    /// A segment that covers `up_to` but extends past it is retained
    /// whole. If truncation removes every segment, a fresh one is created
    /// based at `up_to + 1` so the offset sequence stays monotone.
    ///
    /// # Errors
    ///
    /// Returns an error if a segment's files cannot be deleted.
    pub fn truncate(&self, up_to: u64) -> LogResult<()> {
        let mut inner = self.inner.write();

        // Segments are ordered, so the ones to drop form a prefix.
        let drop_count = inner
            .segments
            .iter()
            .take_while(|s| s.next_offset() <= up_to + 1)
            .count();

        let removed: Vec<Segment> = inner.segments.drain(..drop_count).collect();
        for segment in removed {
            segment.remove()?;
        }

        if inner.segments.is_empty() {
            inner.rotate(up_to + 1, self.config)?;
        }

        debug!(up_to, removed = drop_count, "truncated log");
        Ok(())
    }

    /// Returns a reader over the raw bytes of every store, concatenated in
    /// base-offset order.
    ///
    /// The stream is the byte-exact durable content of the log, framed as
    /// written (`[u64 BE length][payload]` per record); it is intended for
    /// snapshotting and replication. Appends may continue while the reader
    /// is consumed: each read observes bytes up to the store's flush point
    /// at that moment.
    #[must_use]
    pub fn reader(&self) -> LogReader {
        let inner = self.inner.write();
        let streams = inner
            .segments
            .iter()
            .map(|s| OriginReader {
                store: s.store_handle(),
                pos: 0,
            })
            .collect();
        LogReader {
            streams,
            current: 0,
        }
    }

    /// Returns a snapshot of the segment layout, in base-offset order.
    #[must_use]
    pub fn segments(&self) -> Vec<SegmentInfo> {
        self.inner
            .read()
            .segments
            .iter()
            .map(|s| SegmentInfo {
                base_offset: s.base_offset(),
                next_offset: s.next_offset(),
                store_bytes: s.store_bytes(),
                index_entries: s.index_entries(),
            })
            .collect()
    }

    /// Closes every segment in order, consuming the log.
    ///
    /// Index files are truncated to their written length here; reopening
    /// the directory afterwards reconstructs the identical log.
    ///
    /// # Errors
    ///
    /// Returns an error if a segment fails to flush or sync.
    pub fn close(self) -> LogResult<()> {
        let inner = self.inner.into_inner();
        for segment in inner.segments {
            segment.close()?;
        }
        Ok(())
    }

    /// Closes the log and deletes its directory with all segment files.
    ///
    /// # Errors
    ///
    /// Returns an error if closing a segment or deleting the directory
    /// fails.
    pub fn remove(self) -> LogResult<()> {
        let inner = self.inner.into_inner();
        let path = inner.dir.path().to_path_buf();

        for segment in inner.segments {
            segment.close()?;
        }
        // Release the directory lock before the LOCK file goes away.
        drop(inner.dir);

        fs::remove_dir_all(path)?;
        Ok(())
    }

    /// Removes the log and reopens an empty one in the same directory
    /// with the same configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal or the reopen fails.
    pub fn reset(self) -> LogResult<Self> {
        let config = self.config;
        let path = self.inner.read().dir.path().to_path_buf();

        self.remove()?;
        Self::open(path, config)
    }
}

impl Inner {
    fn first(&self) -> &Segment {
        self.segments.first().expect("log always has a segment")
    }

    fn active(&self) -> &Segment {
        self.segments.last().expect("log always has a segment")
    }

    fn active_mut(&mut self) -> &mut Segment {
        self.segments.last_mut().expect("log always has a segment")
    }

    /// Creates a segment based at `base_offset` and makes it active.
    fn rotate(&mut self, base_offset: u64, config: Config) -> LogResult<()> {
        let segment = Segment::new(&self.dir, base_offset, config)?;
        debug!(base_offset, "rotated to new segment");
        self.segments.push(segment);
        Ok(())
    }
}

/// A byte stream over the whole log, returned by [`Log::reader`].
///
/// Yields each segment's store content from position 0, in base-offset
/// order. Each underlying stream tracks its own cursor.
#[derive(Debug)]
pub struct LogReader {
    streams: Vec<OriginReader>,
    current: usize,
}

#[derive(Debug)]
struct OriginReader {
    store: Arc<Store>,
    pos: u64,
}

impl Read for LogReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while let Some(stream) = self.streams.get_mut(self.current) {
            let n = stream
                .store
                .read_at(buf, stream.pos)
                .map_err(io::Error::other)?;
            if n > 0 {
                stream.pos += n as u64;
                return Ok(n);
            }
            self.current += 1;
        }
        Ok(0)
    }
}

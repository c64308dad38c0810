//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during store and index operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of the store.
    #[error("read beyond end of store: position {pos}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read position.
        pos: u64,
        /// The requested read length.
        len: u64,
        /// The current store size.
        size: u64,
    },

    /// The index has no room for another entry.
    ///
    /// Surfaced from [`crate::Index::write`] when the memory mapping is
    /// exhausted; the caller is expected to rotate to a fresh segment.
    #[error("index full: capacity {capacity} bytes")]
    IndexFull {
        /// The mapped capacity in bytes.
        capacity: u64,
    },

    /// Attempted to read an index entry past the written region.
    #[error("index entry {rel} out of range: {entries} entries written")]
    EntryOutOfRange {
        /// The requested relative record number.
        rel: u32,
        /// The number of entries currently written.
        entries: u64,
    },
}

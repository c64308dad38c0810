//! Error types for the log engine.

use std::io;
use thiserror::Error;

/// Result type for log operations.
pub type LogResult<T> = Result<T, LogError>;

/// Errors that can occur in log operations.
#[derive(Debug, Error)]
pub enum LogError {
    /// Storage primitive error.
    #[error("storage error: {0}")]
    Storage(#[from] seqlog_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read was requested for an offset no segment covers.
    ///
    /// The offset is below the lowest retained offset, above the highest
    /// assigned one, or inside a truncated range.
    #[error("offset out of range: {offset}")]
    OffsetOutOfRange {
        /// The requested offset.
        offset: u64,
    },

    /// The log directory is locked by another live log.
    #[error("log directory locked: another process has exclusive access")]
    Locked,
}

//! # Seqlog Core
//!
//! Segmented commit log engine for seqlog.
//!
//! This crate provides:
//! - [`Log`] - the directory-scoped log: routing, rotation, truncation
//! - [`Config`] - size limits and the initial offset
//! - [`Record`] - the value/offset pair returned by reads
//! - [`LogReader`] - a byte stream over the whole durable log content
//!
//! Segments and their store/index pairing are internal; the log is the
//! public surface. The upstream network layer that turns transport
//! requests into `append`/`read` calls lives outside this crate entirely.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dir;
mod error;
mod log;
mod record;
mod segment;

pub use config::Config;
pub use error::{LogError, LogResult};
pub use log::{Log, LogReader, SegmentInfo};
pub use record::Record;

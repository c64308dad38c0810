//! # Seqlog Storage
//!
//! On-disk primitives for the seqlog commit log.
//!
//! This crate provides the two file formats everything else is built on:
//!
//! - [`Store`] - an append-only file of length-framed records
//! - [`Index`] - a memory-mapped table mapping relative record numbers to
//!   byte positions in the paired store
//!
//! Neither type knows anything about logical offsets, segments, or the log
//! directory layout. The store deals in byte positions, the index in
//! segment-relative record numbers; `seqlog_core` owns all offset
//! interpretation.
//!
//! ## Example
//!
//! ```no_run
//! use seqlog_storage::Store;
//! use std::path::Path;
//!
//! let store = Store::open(Path::new("0.store")).unwrap();
//! let (written, pos) = store.append(b"hello world").unwrap();
//! let payload = store.read(pos).unwrap();
//! assert_eq!(&payload, b"hello world");
//! ```

#![warn(missing_docs)]

mod error;
mod index;
mod store;

pub use error::{StorageError, StorageResult};
pub use index::{Index, ENTRY_WIDTH, OFF_WIDTH, POS_WIDTH};
pub use store::{Store, LEN_WIDTH};

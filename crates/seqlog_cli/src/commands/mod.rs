//! Command implementations and shared directory-walking helpers.

pub mod dump;
pub mod inspect;
pub mod verify;

use seqlog_storage::LEN_WIDTH;
use std::path::{Path, PathBuf};

pub(crate) type CommandResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Returns the base offsets of the segments in a log directory, sorted
/// ascending.
///
/// Only `.store` files are consulted; an index without a store is not a
/// usable segment anyway.
pub(crate) fn base_offsets(dir: &Path) -> CommandResult<Vec<u64>> {
    let mut bases = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_store = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "store");
        if !is_store {
            continue;
        }
        if let Some(base) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<u64>().ok())
        {
            bases.push(base);
        }
    }

    bases.sort_unstable();
    Ok(bases)
}

pub(crate) fn store_path(dir: &Path, base: u64) -> PathBuf {
    dir.join(format!("{base:020}.store"))
}

pub(crate) fn index_path(dir: &Path, base: u64) -> PathBuf {
    dir.join(format!("{base:020}.index"))
}

/// Walks a store file by its length framing.
///
/// Returns `(position, payload)` for every complete record; a truncated
/// trailing frame is ignored, mirroring how the log itself would never
/// have indexed it.
pub(crate) fn walk_store(path: &Path) -> CommandResult<Vec<(u64, Vec<u8>)>> {
    let bytes = std::fs::read(path)?;
    let mut records = Vec::new();
    let mut at = 0usize;

    while at + LEN_WIDTH as usize <= bytes.len() {
        let len_bytes: [u8; LEN_WIDTH as usize] = bytes[at..at + LEN_WIDTH as usize]
            .try_into()
            .expect("slice is LEN_WIDTH bytes");
        let len = u64::from_be_bytes(len_bytes) as usize;

        let payload_at = at + LEN_WIDTH as usize;
        if payload_at + len > bytes.len() {
            break;
        }

        records.push((at as u64, bytes[payload_at..payload_at + len].to_vec()));
        at = payload_at + len;
    }

    Ok(records)
}

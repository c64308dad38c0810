//! Verify command implementation.

use super::{base_offsets, index_path, store_path, walk_store, CommandResult};
use seqlog_storage::{ENTRY_WIDTH, OFF_WIDTH};
use std::path::Path;
use tracing::info;

/// Runs the verify command.
///
/// For every segment, walks the store by length framing and checks that
/// index entry `i` records relative number `i` and the position of the
/// `i`-th store record. Reports the first mismatch per segment.
pub fn run(dir: &Path) -> CommandResult<()> {
    let bases = base_offsets(dir)?;
    if bases.is_empty() {
        return Err(format!("no segment files found in {}", dir.display()).into());
    }

    let mut failures = 0usize;

    for &base in &bases {
        let records = walk_store(&store_path(dir, base))?;
        let index_bytes = std::fs::read(index_path(dir, base))?;

        match check_segment(&records, &index_bytes) {
            Ok(()) => info!(base, records = records.len(), "segment ok"),
            Err(message) => {
                failures += 1;
                eprintln!("segment {base}: {message}");
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} segment(s) failed verification").into());
    }

    println!("ok: {} segment(s) verified", bases.len());
    Ok(())
}

/// Checks every store record against its index entry.
fn check_segment(records: &[(u64, Vec<u8>)], index_bytes: &[u8]) -> Result<(), String> {
    for (i, (pos, _)) in records.iter().enumerate() {
        let at = i * ENTRY_WIDTH as usize;
        if at + ENTRY_WIDTH as usize > index_bytes.len() {
            return Err(format!(
                "index too short: {} bytes, need entry {i}",
                index_bytes.len()
            ));
        }

        let rel_bytes: [u8; OFF_WIDTH as usize] = index_bytes[at..at + OFF_WIDTH as usize]
            .try_into()
            .expect("slice is OFF_WIDTH bytes");
        let pos_bytes: [u8; 8] = index_bytes[at + OFF_WIDTH as usize..at + ENTRY_WIDTH as usize]
            .try_into()
            .expect("slice is POS_WIDTH bytes");

        let entry_rel = u32::from_be_bytes(rel_bytes);
        let entry_pos = u64::from_be_bytes(pos_bytes);

        if entry_rel != i as u32 {
            return Err(format!("entry {i}: relative number {entry_rel}, expected {i}"));
        }
        if entry_pos != *pos {
            return Err(format!("entry {i}: position {entry_pos}, store says {pos}"));
        }
    }

    Ok(())
}

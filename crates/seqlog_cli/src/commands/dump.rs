//! Dump command implementation.

use super::{base_offsets, store_path, walk_store, CommandResult};
use std::path::Path;

/// Longest payload prefix shown per record.
const PREVIEW_LEN: usize = 32;

/// Runs the dump command.
///
/// Walks segments in base-offset order, printing one line per record
/// starting at `from`: offset, payload length, and a printable preview.
pub fn run(dir: &Path, from: u64, limit: Option<usize>) -> CommandResult<()> {
    let bases = base_offsets(dir)?;
    if bases.is_empty() {
        return Err(format!("no segment files found in {}", dir.display()).into());
    }

    let mut printed = 0usize;

    for &base in &bases {
        let records = walk_store(&store_path(dir, base))?;

        for (i, (_, payload)) in records.iter().enumerate() {
            let offset = base + i as u64;
            if offset < from {
                continue;
            }
            if limit.is_some_and(|limit| printed >= limit) {
                return Ok(());
            }

            println!("{offset}\t{}\t{}", payload.len(), preview(payload));
            printed += 1;
        }
    }

    if printed == 0 {
        println!("(no records at or above offset {from})");
    }

    Ok(())
}

/// Renders a printable prefix of a payload, escaping non-ASCII bytes.
fn preview(payload: &[u8]) -> String {
    let mut out = String::new();
    for &byte in payload.iter().take(PREVIEW_LEN) {
        if byte.is_ascii_graphic() || byte == b' ' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("\\x{byte:02x}"));
        }
    }
    if payload.len() > PREVIEW_LEN {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_escapes_binary() {
        assert_eq!(preview(b"abc"), "abc");
        assert_eq!(preview(&[0x00, 0x41]), "\\x00A");
    }

    #[test]
    fn preview_truncates_long_payloads() {
        let long = vec![b'a'; 100];
        let rendered = preview(&long);
        assert!(rendered.ends_with("..."));
        assert_eq!(rendered.len(), PREVIEW_LEN + 3);
    }
}

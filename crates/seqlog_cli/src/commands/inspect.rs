//! Inspect command implementation.

use super::{base_offsets, index_path, store_path, walk_store, CommandResult};
use serde::Serialize;
use std::path::Path;

/// Log inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Log directory path.
    pub dir: String,
    /// Lowest retained offset.
    pub lowest_offset: u64,
    /// Highest assigned offset, if any record exists.
    pub highest_offset: Option<u64>,
    /// Total record count across segments.
    pub record_count: usize,
    /// Total store bytes across segments.
    pub store_bytes: u64,
    /// Per-segment breakdown.
    pub segments: Vec<SegmentRow>,
}

/// One segment's line in the inspection table.
#[derive(Debug, Serialize)]
pub struct SegmentRow {
    /// Base offset of the segment.
    pub base_offset: u64,
    /// Number of complete records in the store.
    pub records: usize,
    /// Store file size in bytes.
    pub store_bytes: u64,
    /// Index file size in bytes (pre-sized while the segment is live).
    pub index_bytes: u64,
}

/// Runs the inspect command.
pub fn run(dir: &Path, format: &str) -> CommandResult<()> {
    let bases = base_offsets(dir)?;
    if bases.is_empty() {
        return Err(format!("no segment files found in {}", dir.display()).into());
    }

    let mut segments = Vec::new();
    let mut record_count = 0usize;
    let mut store_bytes = 0u64;
    let mut highest_offset = None;

    for &base in &bases {
        let records = walk_store(&store_path(dir, base))?;
        let store_size = std::fs::metadata(store_path(dir, base))?.len();
        let index_size = std::fs::metadata(index_path(dir, base))
            .map(|m| m.len())
            .unwrap_or(0);

        if !records.is_empty() {
            highest_offset = Some(base + records.len() as u64 - 1);
        }
        record_count += records.len();
        store_bytes += store_size;

        segments.push(SegmentRow {
            base_offset: base,
            records: records.len(),
            store_bytes: store_size,
            index_bytes: index_size,
        });
    }

    let result = InspectResult {
        dir: dir.display().to_string(),
        lowest_offset: bases[0],
        highest_offset,
        record_count,
        store_bytes,
        segments,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Seqlog Log Inspection");
    println!("=====================");
    println!();
    println!("Dir: {}", result.dir);
    println!();
    println!("Offsets:");
    println!("  Lowest:  {}", result.lowest_offset);
    match result.highest_offset {
        Some(highest) => println!("  Highest: {highest}"),
        None => println!("  Highest: (empty log)"),
    }
    println!();
    println!("Totals:");
    println!("  Records:     {}", result.record_count);
    println!("  Store bytes: {}", result.store_bytes);
    println!();
    println!("Segments:");
    for seg in &result.segments {
        println!(
            "  [{:>8}] {} records, {} store bytes, {} index bytes",
            seg.base_offset, seg.records, seg.store_bytes, seg.index_bytes
        );
    }
}

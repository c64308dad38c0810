//! Shared helpers for the seqlog benchmarks.

/// Creates a deterministic payload of the given size.
pub fn sample_payload(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

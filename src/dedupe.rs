//! Content fingerprinting and duplicate removal.
//!
//! Duplicates are identified by a SHA-256 digest over the canonical title
//! and link (title and summary when the link is absent), so the same story
//! picked up from two sources — or from two runs — hashes identically.
//!
//! [`dedupe`] takes the seen-set as an explicit input/output pair instead of
//! mutating hidden state, so the same function serves first runs (empty set)
//! and incremental runs (set seeded from the output store).

use crate::models::NormalizedRecord;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Deterministic fingerprint over canonical item fields, lowercase hex.
pub fn content_hash(title: &str, link: &str, summary: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\n");
    if link.is_empty() {
        hasher.update(summary.as_bytes());
    } else {
        hasher.update(link.as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Retain only records whose hash is not already in `seen`, preserving input
/// order. First seen wins, both against the pre-seeded set and within the
/// input itself.
pub fn dedupe(
    records: Vec<NormalizedRecord>,
    mut seen: HashSet<String>,
) -> (Vec<NormalizedRecord>, HashSet<String>) {
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.content_hash.clone()) {
            kept.push(record);
        }
    }
    (kept, seen)
}

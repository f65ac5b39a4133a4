//! Deterministic fingerprints used for document identity and pseudo-scores.
//!
//! Every value here is derived from SHA-256 so it is stable across processes
//! and platforms. Nothing in this module is meant to be cryptographically
//! meaningful; it only has to collapse identical inputs to identical outputs.

use sha2::{Digest, Sha256};

/// Separator placed between fingerprint parts so `("ab", "c")` and `("a", "bc")`
/// never collide.
const PART_SEPARATOR: u8 = 0x1f;

/// Length of the short document identifier in hex characters.
pub const SHORT_ID_LEN: usize = 16;

fn digest(parts: &[&str]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([PART_SEPARATOR]);
        }
        hasher.update(part.as_bytes());
    }
    hasher.finalize().into()
}

/// Full hex-encoded content hash of the given parts.
pub fn content_hash(parts: &[&str]) -> String {
    let bytes = digest(parts);
    let mut out = String::with_capacity(64);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Short stable identifier: the first [`SHORT_ID_LEN`] hex chars of the content hash.
pub fn short_id(parts: &[&str]) -> String {
    let mut hash = content_hash(parts);
    hash.truncate(SHORT_ID_LEN);
    hash
}

/// Stable unsigned number derived from `input`, for pseudo-scores and counters.
pub fn stable_number(input: &str) -> u64 {
    let bytes = digest(&[input]);
    let mut head = [0u8; 8];
    head.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(head)
}

//! Content hash computation for change detection.

use sha2::{Digest, Sha256};
use std::fmt;

/// SHA256 hash of raw file bytes.
///
/// Used to decide whether an externally-modified file actually changed
/// before the index reloads it. Computed from raw bytes (before BOM
/// stripping) to capture the exact state on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHash {
    hex: String,
}

impl ContentHash {
    /// Computes a SHA256 hash of the given bytes.
    ///
    /// The hash is a 64-character lowercase hex string.
    pub fn compute(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let result = hasher.finalize();
        let hex = format!("{:x}", result);
        Self { hex }
    }

    /// Returns the hash as a 64-character lowercase hex string.
    pub fn as_str(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex)
    }
}

//! Content hashing for freshness detection.
//!
//! Rebuilds compare source content hashes to reuse documents whose files
//! have not changed, and the config reloader uses the same hash to skip
//! spurious watcher events.

/// Compute a 64-bit content hash (truncated blake3).
#[inline]
pub fn compute(bytes: &[u8]) -> u64 {
    let hash = blake3::hash(bytes);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}

//! Content hashing helpers built on blake3.
//!
//! Used for head-child identity keys (`style/<hash>`, `script/<hash>`) and
//! for the processed-inline minification cache.

/// Short hex fingerprint of a string (8 hex chars).
///
/// Stable across runs for identical input; suitable for identity keys
/// embedded in human-readable diagnostics.
pub fn fingerprint(content: &str) -> String {
    let hash = blake3::hash(content.as_bytes());
    hash.to_hex()[..8].to_string()
}

/// Full-length content hash, used as a cache key.
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

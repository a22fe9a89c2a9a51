//! Stable hashing helpers
//!
//! All identity hashes in the IR are SHA-256, hex-encoded and truncated to
//! 32 chars where a shorter id suffices. Two machines indexing the same
//! bytes must produce byte-identical ids, so nothing here may depend on
//! process state, pointer values, or iteration order.

use sha2::{Digest, Sha256};

/// SHA-256 over the UTF-8 bytes, full 64-char hex digest.
///
/// Used for `content_hash`: trailing whitespace is preserved by the caller
/// slicing exact byte spans.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// SHA-256 over a pre-joined identity key, truncated to 32 hex chars.
pub fn id_hash(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..32].to_string()
}

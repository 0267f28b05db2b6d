//! Content hashing for change detection.
//!
//! Raw payloads are hashed on every fetch; a record is unchanged iff the new
//! hash equals the stored one. `serde_json::Value` maps serialize with sorted
//! keys, so the digest is independent of upstream field ordering.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a raw payload's deterministic serialization.
pub fn content_hash(payload: &Value) -> String {
    // Value maps are BTreeMaps: serialization sorts keys, arrays keep order.
    let serialized = payload.to_string();
    hex_digest(serialized.as_bytes())
}

/// SHA-256 hex digest of a thumbnail URL.
///
/// Stored alongside the canonical record so the image and embedding stages
/// can detect URL rotation independently of unrelated metadata changes.
pub fn url_hash(url: &str) -> String {
    hex_digest(url.as_bytes())
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

//! Content fingerprint for change detection.
//!
//! The digest covers exactly `{displayName, description, toolNames, endpoint}`.
//! Tool order is significant. The SHA-256 digest is truncated to
//! [`FINGERPRINT_HEX_LEN`] hex characters: at 64 bits a collision inside a
//! corpus of tens of thousands of records is negligible, and a collision only
//! means one change goes unnoticed until the next edit.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Length of a fingerprint in hex characters (8 digest bytes).
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Canonical JSON encoding that feeds the digest.
///
/// Keys are emitted in sorted order whether or not `serde_json` preserves
/// insertion order, so the encoding is stable across builds.
pub fn canonical_fingerprint_json(
    display_name: &str,
    description: &str,
    tool_names: &[String],
    endpoint: Option<&str>,
) -> String {
    let v: Value = json!({
        "description": description,
        "displayName": display_name,
        "endpoint": endpoint,
        "toolNames": tool_names,
    });
    v.to_string()
}

pub fn fingerprint(
    display_name: &str,
    description: &str,
    tool_names: &[String],
    endpoint: Option<&str>,
) -> String {
    let canonical = canonical_fingerprint_json(display_name, description, tool_names, endpoint);
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(&digest[..FINGERPRINT_HEX_LEN / 2])
}

//! SHA-256 checksum utilities
//!
//! A single canonical checksum format (`sha256:<hex>`) is used for
//! user-declared checksums. Lockfile entries and cache keys store the bare
//! hex digest.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::{Error, Result};

/// Prefix for user-facing checksums
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 digest of content as lowercase hex.
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 digest of a file's contents.
pub fn hash_file(path: &Path) -> Result<String> {
    let content = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(sha256_hex(&content))
}

/// Render a bare hex digest in the canonical `sha256:<hex>` form.
pub fn format_checksum(hex: &str) -> String {
    format!("{PREFIX}{hex}")
}

/// Split a declared checksum into its algorithm and digest parts.
pub fn parse_checksum(value: &str) -> Result<(&str, &str)> {
    match value.split_once(':') {
        Some((algo, hex)) if !algo.is_empty() && !hex.is_empty() => Ok((algo, hex)),
        _ => Err(Error::MalformedChecksum {
            value: value.to_string(),
        }),
    }
}

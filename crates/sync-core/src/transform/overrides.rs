//! Post-materialization overrides and destination conflict detection.
//!
//! Overrides match by the destination file's basename, so they target the
//! output filename as seen in a destination directory, not the
//! source-relative path.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use sync_config::model::Override;

use crate::{Error, Result};

/// Check declared override files against the project root. Applied at
/// validation time so a missing overlay fails before any writes happen.
pub fn validate_override_files(project_root: &Path, overrides: &[Override]) -> Result<()> {
    for ov in overrides {
        let abs = project_root.join(&ov.file);
        match std::fs::metadata(&abs) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::OverrideFileMissing {
                    target: ov.target.clone(),
                    file: ov.file.clone(),
                });
            }
            Err(e) => {
                return Err(Error::OverrideRead {
                    target: ov.target.clone(),
                    file: ov.file.clone(),
                    source: e,
                });
            }
        }
    }
    Ok(())
}

/// Apply one override strategy to existing content.
pub fn apply_strategy(
    target: &str,
    strategy: &str,
    existing: &[u8],
    override_bytes: &[u8],
) -> Result<Vec<u8>> {
    match strategy {
        "append" => Ok(append(existing, override_bytes)),
        "prepend" => Ok(prepend(existing, override_bytes)),
        "replace" => Ok(override_bytes.to_vec()),
        other => Err(Error::InvalidStrategy {
            target: target.to_string(),
            strategy: other.to_string(),
        }),
    }
}

fn append(existing: &[u8], addition: &[u8]) -> Vec<u8> {
    let mut out = existing.to_vec();
    if !out.is_empty() && out.last() != Some(&b'\n') {
        out.push(b'\n');
    }
    out.extend_from_slice(addition);
    out
}

fn prepend(existing: &[u8], addition: &[u8]) -> Vec<u8> {
    let mut out = addition.to_vec();
    if !out.is_empty() && out.last() != Some(&b'\n') {
        out.push(b'\n');
    }
    out.extend_from_slice(existing);
    out
}

/// Fail when distinct sources land on one destination path without an
/// override claiming that filename; an override makes the merge explicit.
/// Different tools resolving one source to different directories never
/// conflict.
pub fn detect_conflicts(
    destinations: &BTreeMap<String, Vec<String>>,
    overrides: &[Override],
) -> Result<()> {
    let claimed: BTreeSet<&str> = overrides.iter().map(|ov| ov.target.as_str()).collect();

    for (destination, sources) in destinations {
        let distinct: BTreeSet<&str> = sources.iter().map(String::as_str).collect();
        if distinct.len() <= 1 {
            continue;
        }
        let base = basename(destination);
        if !claimed.contains(base) {
            return Err(Error::DestinationConflict {
                destination: destination.clone(),
                sources: distinct.into_iter().collect::<Vec<_>>().join(", "),
            });
        }
    }
    Ok(())
}

pub(crate) fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

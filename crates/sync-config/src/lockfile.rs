//! Lockfile codec
//!
//! The lockfile is the source of truth for sync. Serialization keeps struct
//! field order and stores file maps in sorted order, so repeated saves of
//! the same state produce identical bytes and stable diffs. Saves are
//! atomic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::{Error, Result};

pub const LOCKFILE_NAME: &str = "agent-sync.lock";

/// Status recorded for a successfully resolved source.
pub const STATUS_OK: &str = "ok";

/// The agent-sync.lock document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    pub version: u32,
    #[serde(default)]
    pub sources: Vec<LockedSource>,
}

impl Default for Lockfile {
    fn default() -> Self {
        Self {
            version: 1,
            sources: Vec::new(),
        }
    }
}

/// The fully resolved, immutable state of one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedSource {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repo: String,
    #[serde(default)]
    pub resolved: ResolvedState,
    #[serde(default)]
    pub status: String,
}

/// Resolved metadata; fields are populated per source kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedState {
    /// Per-file content hashes for every included file.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, FileHash>,

    // git fields
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub commit: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tree: String,

    // url fields
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha256: String,

    // local fields
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

/// Content hash of a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHash {
    pub sha256: String,
}

impl LockedSource {
    /// Human summary of the pin: short commit for git, truncated digest for
    /// url, file count for local.
    pub fn pin_summary(&self) -> String {
        match self.kind.as_str() {
            "git" if !self.resolved.commit.is_empty() => short(&self.resolved.commit).to_string(),
            "url" if !self.resolved.sha256.is_empty() => {
                format!("sha256:{}", short(&self.resolved.sha256))
            }
            "local" => format!("({} files)", self.resolved.files.len()),
            _ => "(unknown)".to_string(),
        }
    }
}

fn short(hash: &str) -> &str {
    if hash.len() > 8 { &hash[..8] } else { hash }
}

/// Read and validate an agent-sync.lock file.
pub fn load(path: &Path) -> Result<Lockfile> {
    let data = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let lockfile: Lockfile = serde_yaml::from_str(&data).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let errors = validate(&lockfile);
    if !errors.is_empty() {
        return Err(Error::LockfileValidation { errors });
    }
    Ok(lockfile)
}

/// Write a lockfile atomically.
pub fn save(path: &Path, lockfile: &Lockfile) -> Result<()> {
    let data = serde_yaml::to_string(lockfile).map_err(|e| Error::Serialize {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    sync_fs::io::write_atomic(path, data.as_bytes())?;
    Ok(())
}

/// Check a lockfile for semantic correctness. Returns every violation.
pub fn validate(lockfile: &Lockfile) -> Vec<String> {
    let mut errors = Vec::new();

    if lockfile.version != 1 {
        errors.push(format!(
            "unsupported version {}; only version 1 is supported",
            lockfile.version
        ));
    }

    let mut names = Vec::new();
    for (i, source) in lockfile.sources.iter().enumerate() {
        let label = if source.name.is_empty() {
            format!("locked_source[{i}]")
        } else {
            format!("locked source '{}'", source.name)
        };

        if source.name.is_empty() {
            errors.push(format!("{label}: 'name' is required"));
        } else if names.contains(&source.name.as_str()) {
            errors.push(format!("{label}: duplicate source name '{}'", source.name));
        } else {
            names.push(source.name.as_str());
        }

        if source.kind.is_empty() {
            errors.push(format!("{label}: 'type' is required"));
        }
        if source.status.is_empty() {
            errors.push(format!("{label}: 'status' is required"));
        }
    }

    errors
}

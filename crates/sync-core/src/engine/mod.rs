//! Operations engine
//!
//! Orchestrates the six operations (update, sync, check, verify, prune,
//! status) over the lockfile, configuration, cache, resolvers, and sandbox.
//! Operations return compound results (written lists, per-source error
//! lists) rather than failing fast; configuration errors still abort
//! immediately.

mod check;
mod prune;
mod status;
mod sync;
mod update;
mod verify;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sync_config::lockfile::{LockedSource, Lockfile};
use sync_config::model::Config;
use sync_config::toolmap::{ResolvedTarget, ToolMap};
use sync_fs::ContentCache;
use sync_source::{Registry, ResolvedSource};

use crate::{Error, Result};

/// Shared state for all operations.
pub struct Engine<'a> {
    pub registry: &'a Registry,
    pub cache: Option<&'a ContentCache>,
    pub project_root: PathBuf,
}

/// Action taken on a single destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAction {
    pub path: String,
    /// "written", "modified", "new", "unchanged", or "removed".
    pub action: String,
}

/// An error attributed to a single source within a batch operation.
#[derive(Debug)]
pub struct SourceFailure {
    pub name: String,
    pub error: Error,
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}

/// A destination file whose hash disagrees with the lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftEntry {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

/// A change detected in an upstream source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDelta {
    pub source: String,
    pub before: String,
    pub after: String,
}

/// Outcome of a sync operation.
#[derive(Debug, Default)]
pub struct SyncResult {
    pub written: Vec<FileAction>,
    pub skipped: Vec<FileAction>,
    pub errors: Vec<SourceFailure>,
}

/// Outcome of a check operation.
#[derive(Debug, Default)]
pub struct CheckResult {
    pub clean: bool,
    pub drifted: Vec<DriftEntry>,
    pub missing: Vec<String>,
}

/// Outcome of a verify operation.
#[derive(Debug, Default)]
pub struct VerifyResult {
    pub up_to_date: Vec<String>,
    pub changed: Vec<SourceDelta>,
    pub errors: Vec<SourceFailure>,
}

/// Outcome of a prune operation.
#[derive(Debug, Default)]
pub struct PruneResult {
    pub removed: Vec<FileAction>,
    pub errors: Vec<SourceFailure>,
}

/// What changed for a single source during update.
#[derive(Debug, Clone)]
pub struct SourceUpdate {
    pub name: String,
    /// Previous lock state; `None` for a first-time source.
    pub before: Option<LockedSource>,
    pub after: LockedSource,
}

/// Outcome of an update operation.
#[derive(Debug, Default)]
pub struct UpdateResult {
    pub updated: Vec<SourceUpdate>,
    pub failed: Vec<SourceFailure>,
    /// `None` on dry runs; otherwise the lockfile to persist.
    pub lockfile: Option<Lockfile>,
}

/// Current state of one configured source relative to its destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub name: String,
    pub kind: String,
    pub pinned_at: String,
    pub targets: Vec<String>,
    pub state: SourceState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Pending,
    Missing,
    Drifted,
    Synced,
}

impl std::fmt::Display for SourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceState::Pending => "pending",
            SourceState::Missing => "missing",
            SourceState::Drifted => "drifted",
            SourceState::Synced => "synced",
        };
        write!(f, "{s}")
    }
}

/// Options for a sync operation.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub dry_run: bool,
}

/// Options for an update operation.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub dry_run: bool,
    /// Interactive confirmation is the embedding application's concern; the
    /// engine treats every update as confirmed.
    pub auto_confirm: bool,
    /// Empty means update every configured source.
    pub source_names: Vec<String>,
}

/// Options for a prune operation.
#[derive(Debug, Clone, Default)]
pub struct PruneOptions {
    pub dry_run: bool,
}

impl Engine<'_> {
    fn tool_map(cfg: &Config) -> ToolMap {
        ToolMap::new(&cfg.tool_definitions)
    }

    /// Expand every configured target through the tool map, grouped by
    /// source name. Tool resolution failures abort: they are configuration
    /// errors, not per-source ones.
    fn resolve_all_targets(
        tool_map: &ToolMap,
        cfg: &Config,
    ) -> Result<BTreeMap<String, Vec<ResolvedTarget>>> {
        let mut map: BTreeMap<String, Vec<ResolvedTarget>> = BTreeMap::new();
        for target in &cfg.targets {
            let resolved = tool_map.resolve_target(target)?;
            map.entry(target.source.clone()).or_default().extend(resolved);
        }
        Ok(map)
    }

    fn locked_by_name(lockfile: &Lockfile) -> BTreeMap<&str, &LockedSource> {
        lockfile
            .sources
            .iter()
            .map(|ls| (ls.name.as_str(), ls))
            .collect()
    }
}

/// Bridge a lockfile entry back into the resolver contract for re-fetching.
fn locked_to_resolved(locked: &LockedSource) -> ResolvedSource {
    ResolvedSource {
        name: locked.name.clone(),
        kind: locked.kind.clone(),
        commit: locked.resolved.commit.clone(),
        tree: locked.resolved.tree.clone(),
        url: locked.resolved.url.clone(),
        repo: locked.repo.clone(),
        path: locked.resolved.path.clone(),
        files: locked
            .resolved
            .files
            .iter()
            .map(|(path, hash)| (path.clone(), hash.sha256.clone()))
            .collect(),
    }
}

/// Join a target destination with a source-relative file path.
fn join_dest(destination: &str, rel: &str) -> String {
    Path::new(destination)
        .join(rel)
        .to_string_lossy()
        .replace('\\', "/")
}

fn short(hash: &str) -> &str {
    if hash.len() > 8 { &hash[..8] } else { hash }
}

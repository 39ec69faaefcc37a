//! Sync: materialize locked content into destinations.
//!
//! The lockfile is authoritative and is never modified here. Writes go
//! through the sandbox; the first failure restores every touched
//! destination from its snapshot.

use std::collections::BTreeMap;
use std::path::Path;

use sync_config::lockfile::{LockedSource, Lockfile};
use sync_config::model::{Config, Override, Transform};
use sync_fs::Sandbox;
use sync_fs::checksum::sha256_hex;
use sync_source::CancelToken;

use super::{Engine, FileAction, SourceFailure, SyncOptions, SyncResult, join_dest, locked_to_resolved};
use crate::transform::{overrides, template};
use crate::{Error, Result};

/// One pending destination write.
struct FileOp {
    dest_path: String,
    content: Vec<u8>,
    source: String,
}

impl Engine<'_> {
    pub fn sync(
        &self,
        lockfile: &Lockfile,
        cfg: &Config,
        opts: &SyncOptions,
        cancel: &CancelToken,
    ) -> Result<SyncResult> {
        let mut result = SyncResult::default();

        let tool_map = Self::tool_map(cfg);
        let target_map = Self::resolve_all_targets(&tool_map, cfg)?;

        let mut transforms_by_source: BTreeMap<&str, Vec<&Transform>> = BTreeMap::new();
        for tx in &cfg.transforms {
            transforms_by_source
                .entry(tx.source.as_str())
                .or_default()
                .push(tx);
        }

        // Materialize the operation list: lockfile order for sources, file
        // map order within each.
        let mut ops: Vec<FileOp> = Vec::new();
        for locked in &lockfile.sources {
            let Some(targets) = target_map.get(&locked.name) else {
                continue;
            };
            cancel.check()?;

            let files = match self.source_files(locked, cancel) {
                Ok(files) => files,
                Err(e) => {
                    if e.is_cancelled() {
                        return Err(e);
                    }
                    result.errors.push(SourceFailure {
                        name: locked.name.clone(),
                        error: e,
                    });
                    continue;
                }
            };

            let files = match apply_transforms(
                files,
                transforms_by_source.get(locked.name.as_str()).map(Vec::as_slice),
                &cfg.variables,
            ) {
                Ok(files) => files,
                Err(e) => {
                    result.errors.push(SourceFailure {
                        name: locked.name.clone(),
                        error: e,
                    });
                    continue;
                }
            };

            for target in targets {
                for (rel, content) in &files {
                    ops.push(FileOp {
                        dest_path: join_dest(&target.destination, rel),
                        content: content.clone(),
                        source: locked.name.clone(),
                    });
                }
            }
        }

        let mut ops = apply_overrides(&self.project_root, ops, &cfg.overrides)?;

        // Stable sort: identical destinations keep configuration order.
        ops.sort_by(|a, b| a.dest_path.cmp(&b.dest_path));

        let mut destinations: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for op in &ops {
            destinations
                .entry(op.dest_path.clone())
                .or_default()
                .push(op.source.clone());
        }
        overrides::detect_conflicts(&destinations, &cfg.overrides)?;

        if opts.dry_run {
            for op in &ops {
                let abs = self.project_root.join(&op.dest_path);
                match std::fs::read(&abs) {
                    Err(_) => result.written.push(FileAction {
                        path: op.dest_path.clone(),
                        action: "new".to_string(),
                    }),
                    Ok(existing) if sha256_hex(&existing) != sha256_hex(&op.content) => {
                        result.written.push(FileAction {
                            path: op.dest_path.clone(),
                            action: "modified".to_string(),
                        });
                    }
                    Ok(_) => result.skipped.push(FileAction {
                        path: op.dest_path.clone(),
                        action: "unchanged".to_string(),
                    }),
                }
            }
            return Ok(result);
        }

        // Snapshot every destination before the first write so a mid-batch
        // failure can restore the exact pre-call state.
        let mut snapshots: BTreeMap<String, Option<Vec<u8>>> = BTreeMap::new();
        for op in &ops {
            snapshots
                .entry(op.dest_path.clone())
                .or_insert_with(|| std::fs::read(self.project_root.join(&op.dest_path)).ok());
        }

        let sandbox = Sandbox::new(&self.project_root)?;
        let mut written_paths: Vec<String> = Vec::new();
        for op in &ops {
            if let Err(cancelled) = cancel.check() {
                rollback(&sandbox, &written_paths, &snapshots);
                return Err(cancelled.into());
            }

            let existing = std::fs::read(self.project_root.join(&op.dest_path)).ok();
            if let Some(existing_bytes) = &existing
                && sha256_hex(existing_bytes) == sha256_hex(&op.content)
            {
                result.skipped.push(FileAction {
                    path: op.dest_path.clone(),
                    action: "unchanged".to_string(),
                });
                continue;
            }

            if let Err(e) = sandbox.write(&op.dest_path, &op.content, 0o644) {
                rollback(&sandbox, &written_paths, &snapshots);
                tracing::warn!(
                    path = %op.dest_path,
                    source = %op.source,
                    "write failed; destinations rolled back"
                );
                result.errors.push(SourceFailure {
                    name: op.source.clone(),
                    error: Error::Fs(e),
                });
                return Ok(result);
            }

            written_paths.push(op.dest_path.clone());
            result.written.push(FileAction {
                path: op.dest_path.clone(),
                action: if existing.is_some() {
                    "modified".to_string()
                } else {
                    "written".to_string()
                },
            });
        }

        Ok(result)
    }

    /// Bytes for every file of a locked source, cache first with a single
    /// resolver fetch for the misses.
    fn source_files(
        &self,
        locked: &LockedSource,
        cancel: &CancelToken,
    ) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut files: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        let mut misses = false;

        for (rel, hash) in &locked.resolved.files {
            cancel.check()?;
            let cached = match self.cache {
                Some(cache) => match cache.get(&hash.sha256) {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::warn!(key = %hash.sha256, error = %e, "cache read failed");
                        None
                    }
                },
                None => None,
            };
            match cached {
                Some(content) => {
                    files.insert(rel.clone(), content);
                }
                None => misses = true,
            }
        }

        if misses {
            let resolver = self.registry.get(&locked.kind)?;
            let resolved = locked_to_resolved(locked);
            let fetched = resolver.fetch(&resolved, &self.project_root, cancel)?;
            for file in fetched {
                if let Some(cache) = self.cache
                    && let Err(e) = cache.put(&file.sha256, &file.content)
                {
                    tracing::warn!(key = %file.sha256, error = %e, "cache put failed");
                }
                files.insert(file.rel_path, file.content);
            }
        }

        for rel in locked.resolved.files.keys() {
            if !files.contains_key(rel) {
                return Err(Error::MissingLockedFile {
                    source_name: locked.name.clone(),
                    path: rel.clone(),
                });
            }
        }

        Ok(files)
    }
}

/// Run template transforms over the file map in configuration order.
/// Non-template transforms are a reserved extension point and are skipped.
fn apply_transforms(
    files: BTreeMap<String, Vec<u8>>,
    transforms: Option<&[&Transform]>,
    globals: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, Vec<u8>>> {
    let Some(transforms) = transforms else {
        return Ok(files);
    };

    let mut files = files;
    for tx in transforms {
        if tx.kind != "template" {
            continue;
        }
        let vars = template::merge_vars(globals, &tx.vars);
        let mut next = BTreeMap::new();
        for (rel, content) in &files {
            next.insert(rel.clone(), template::apply(rel, content, &vars)?);
        }
        files = next;
    }
    Ok(files)
}

/// Apply overrides in configuration order, matching operations by
/// destination basename. The input list is consumed and a modified copy
/// returned.
fn apply_overrides(
    project_root: &Path,
    mut ops: Vec<FileOp>,
    config_overrides: &[Override],
) -> Result<Vec<FileOp>> {
    for ov in config_overrides {
        let indices: Vec<usize> = ops
            .iter()
            .enumerate()
            .filter(|(_, op)| overrides::basename(&op.dest_path) == ov.target)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            return Err(Error::OverrideTargetMissing {
                target: ov.target.clone(),
            });
        }

        let abs = project_root.join(&ov.file);
        let override_bytes = std::fs::read(&abs).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::OverrideFileMissing {
                    target: ov.target.clone(),
                    file: ov.file.clone(),
                }
            } else {
                Error::OverrideRead {
                    target: ov.target.clone(),
                    file: ov.file.clone(),
                    source: e,
                }
            }
        })?;

        for i in indices {
            ops[i].content = overrides::apply_strategy(
                &ov.target,
                &ov.strategy,
                &ops[i].content,
                &override_bytes,
            )?;
        }
    }
    Ok(ops)
}

/// Restore written destinations from their snapshots: write back files that
/// existed, remove ones that did not.
fn rollback(sandbox: &Sandbox, written: &[String], snapshots: &BTreeMap<String, Option<Vec<u8>>>) {
    for path in written {
        match snapshots.get(path) {
            Some(Some(content)) => {
                let _ = sandbox.write(path, content, 0o644);
            }
            Some(None) => {
                let _ = sandbox.remove(path);
            }
            None => {}
        }
    }
}

//! Update: resolve sources upstream and rebuild the lockfile.

use std::collections::BTreeMap;

use sync_config::lockfile::{self, LockedSource, Lockfile, ResolvedState};
use sync_config::model::{Config, Source};
use sync_source::{CancelToken, ResolvedSource};

use super::{Engine, SourceFailure, SourceUpdate, UpdateOptions, UpdateResult};
use crate::{Error, Result};

impl Engine<'_> {
    /// Resolve the selected sources and build a new lockfile.
    ///
    /// Resolution failures are collected per source and never abort the
    /// batch. The returned lockfile keeps configuration order, preferring a
    /// freshly resolved record, then the previously locked one; a source
    /// that failed on its first appearance is omitted. Dry runs report
    /// without building a lockfile.
    pub fn update(
        &self,
        cfg: &Config,
        current: Option<&Lockfile>,
        opts: &UpdateOptions,
        cancel: &CancelToken,
    ) -> Result<UpdateResult> {
        let mut result = UpdateResult::default();

        let by_name: BTreeMap<&str, &Source> =
            cfg.sources.iter().map(|s| (s.name.as_str(), s)).collect();

        let selected: Vec<&Source> = if opts.source_names.is_empty() {
            cfg.sources.iter().collect()
        } else {
            let mut filtered = Vec::new();
            for name in &opts.source_names {
                match by_name.get(name.as_str()) {
                    Some(source) => filtered.push(*source),
                    None => result.failed.push(SourceFailure {
                        name: name.clone(),
                        error: Error::UnknownSource { name: name.clone() },
                    }),
                }
            }
            filtered
        };

        let current_by_name: BTreeMap<&str, &LockedSource> = current
            .map(|lf| {
                lf.sources
                    .iter()
                    .map(|ls| (ls.name.as_str(), ls))
                    .collect()
            })
            .unwrap_or_default();

        let mut fresh: BTreeMap<String, LockedSource> = BTreeMap::new();
        for spec in selected {
            cancel.check()?;

            let resolver = match self.registry.get(&spec.kind) {
                Ok(resolver) => resolver,
                Err(e) => {
                    result.failed.push(SourceFailure {
                        name: spec.name.clone(),
                        error: e.into(),
                    });
                    continue;
                }
            };

            let resolved = match resolver.resolve(spec, &self.project_root, cancel) {
                Ok(resolved) => resolved,
                Err(e) => {
                    let error = Error::from(e);
                    if error.is_cancelled() {
                        return Err(error);
                    }
                    tracing::warn!(source = %spec.name, error = %error, "source resolution failed");
                    result.failed.push(SourceFailure {
                        name: spec.name.clone(),
                        error,
                    });
                    continue;
                }
            };

            let locked = resolved_to_locked(spec, &resolved);
            result.updated.push(SourceUpdate {
                name: spec.name.clone(),
                before: current_by_name.get(spec.name.as_str()).map(|ls| (*ls).clone()),
                after: locked.clone(),
            });

            // Warm the cache for the coming sync; failures here are never
            // fatal to the update.
            if let Some(cache) = self.cache {
                match resolver.fetch(&resolved, &self.project_root, cancel) {
                    Ok(fetched) => {
                        for file in &fetched {
                            if let Err(e) = cache.put(&file.sha256, &file.content) {
                                tracing::warn!(
                                    source = %spec.name,
                                    file = %file.rel_path,
                                    error = %e,
                                    "cache put failed"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        if cancel.is_cancelled() {
                            return Err(Error::from(e));
                        }
                        tracing::debug!(
                            source = %spec.name,
                            error = %e,
                            "prefetch failed; sync will fetch on demand"
                        );
                    }
                }
            }

            fresh.insert(spec.name.clone(), locked);
        }

        if opts.dry_run {
            return Ok(result);
        }

        let mut new_lockfile = Lockfile {
            version: 1,
            sources: Vec::new(),
        };
        for spec in &cfg.sources {
            if let Some(locked) = fresh.get(&spec.name) {
                new_lockfile.sources.push(locked.clone());
            } else if let Some(locked) = current_by_name.get(spec.name.as_str()) {
                new_lockfile.sources.push((*locked).clone());
            }
        }

        result.lockfile = Some(new_lockfile);
        Ok(result)
    }
}

fn resolved_to_locked(spec: &Source, resolved: &ResolvedSource) -> LockedSource {
    LockedSource {
        name: spec.name.clone(),
        kind: spec.kind.clone(),
        repo: spec.repo.clone(),
        resolved: ResolvedState {
            commit: resolved.commit.clone(),
            tree: resolved.tree.clone(),
            url: resolved.url.clone(),
            sha256: url_content_hash(resolved),
            path: resolved.path.clone(),
            files: resolved
                .files
                .iter()
                .map(|(path, hash)| {
                    (
                        path.clone(),
                        lockfile::FileHash {
                            sha256: hash.clone(),
                        },
                    )
                })
                .collect(),
        },
        status: lockfile::STATUS_OK.to_string(),
    }
}

/// For url sources the resolved record carries the single file's digest.
fn url_content_hash(resolved: &ResolvedSource) -> String {
    if resolved.kind == "url" {
        resolved.files.values().next().cloned().unwrap_or_default()
    } else {
        String::new()
    }
}

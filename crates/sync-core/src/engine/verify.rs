//! Verify: compare the lockfile against current upstream state without
//! touching destinations.

use sync_config::lockfile::{LockedSource, Lockfile};
use sync_config::model::Config;
use sync_source::{CancelToken, ResolvedSource};

use super::{Engine, SourceDelta, SourceFailure, VerifyResult, short};
use crate::{Error, Result};

impl Engine<'_> {
    /// Re-resolve the configured (or named) sources and report which have
    /// changed upstream since the lockfile was written.
    pub fn verify(
        &self,
        lockfile: &Lockfile,
        cfg: &Config,
        source_names: &[String],
        cancel: &CancelToken,
    ) -> Result<VerifyResult> {
        let mut result = VerifyResult::default();

        let locked_by_name = Self::locked_by_name(lockfile);
        let config_by_name: std::collections::BTreeMap<&str, &sync_config::model::Source> =
            cfg.sources.iter().map(|s| (s.name.as_str(), s)).collect();

        let names: Vec<String> = if source_names.is_empty() {
            cfg.sources.iter().map(|s| s.name.clone()).collect()
        } else {
            source_names.to_vec()
        };

        for name in &names {
            cancel.check()?;

            let Some(spec) = config_by_name.get(name.as_str()) else {
                result.errors.push(SourceFailure {
                    name: name.clone(),
                    error: Error::UnknownSource { name: name.clone() },
                });
                continue;
            };

            let Some(locked) = locked_by_name.get(name.as_str()) else {
                result.changed.push(SourceDelta {
                    source: name.clone(),
                    before: "(not locked)".to_string(),
                    after: "(needs update)".to_string(),
                });
                continue;
            };

            let resolver = match self.registry.get(&spec.kind) {
                Ok(resolver) => resolver,
                Err(e) => {
                    result.errors.push(SourceFailure {
                        name: name.clone(),
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
                    result.errors.push(SourceFailure {
                        name: name.clone(),
                        error,
                    });
                    continue;
                }
            };

            if has_changed(locked, &resolved) {
                result.changed.push(SourceDelta {
                    source: name.clone(),
                    before: locked.pin_summary(),
                    after: summarize_resolved(&resolved),
                });
            } else {
                result.up_to_date.push(name.clone());
            }
        }

        Ok(result)
    }
}

/// Git sources change by commit; url and local sources change when the file
/// count or any file hash differs.
fn has_changed(locked: &LockedSource, resolved: &ResolvedSource) -> bool {
    if locked.kind == "git" && !resolved.commit.is_empty() && locked.resolved.commit != resolved.commit
    {
        return true;
    }

    if locked.resolved.files.len() != resolved.files.len() {
        return true;
    }
    locked.resolved.files.iter().any(|(path, hash)| {
        resolved
            .files
            .get(path)
            .is_none_or(|new_hash| &hash.sha256 != new_hash)
    })
}

fn summarize_resolved(resolved: &ResolvedSource) -> String {
    match resolved.kind.as_str() {
        "git" if !resolved.commit.is_empty() => short(&resolved.commit).to_string(),
        "url" => resolved
            .files
            .values()
            .next()
            .map(|hash| format!("sha256:{}", short(hash)))
            .unwrap_or_else(|| "(unknown)".to_string()),
        "local" => format!("({} files)", resolved.files.len()),
        _ => "(unknown)".to_string(),
    }
}

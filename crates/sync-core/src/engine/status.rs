//! Status: per-source summary of lock pin, destinations, and drift state.

use sync_config::lockfile::LockedSource;
use sync_config::lockfile::Lockfile;
use sync_config::model::Config;
use sync_config::toolmap::ResolvedTarget;
use sync_fs::checksum::sha256_hex;
use sync_source::CancelToken;

use super::{Engine, SourceState, SourceStatus, join_dest};
use crate::Result;

impl Engine<'_> {
    /// Summarize each configured (or named) source: its pin, its target
    /// destinations, and whether the destinations match the lockfile.
    pub fn status(
        &self,
        lockfile: &Lockfile,
        cfg: &Config,
        source_names: &[String],
        cancel: &CancelToken,
    ) -> Result<Vec<SourceStatus>> {
        let tool_map = Self::tool_map(cfg);
        let target_map = Self::resolve_all_targets(&tool_map, cfg)?;
        let locked_by_name = Self::locked_by_name(lockfile);

        let names: Vec<String> = if source_names.is_empty() {
            cfg.sources.iter().map(|s| s.name.clone()).collect()
        } else {
            source_names.to_vec()
        };

        let mut statuses = Vec::with_capacity(names.len());
        for name in &names {
            cancel.check()?;

            let targets = target_map.get(name.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            let kind = cfg
                .sources
                .iter()
                .find(|s| &s.name == name)
                .map(|s| s.kind.clone())
                .unwrap_or_default();

            let status = match locked_by_name.get(name.as_str()) {
                None => SourceStatus {
                    name: name.clone(),
                    kind,
                    pinned_at: "(not locked)".to_string(),
                    targets: targets.iter().map(|t| t.destination.clone()).collect(),
                    state: SourceState::Pending,
                },
                Some(locked) => SourceStatus {
                    name: name.clone(),
                    kind,
                    pinned_at: locked.pin_summary(),
                    targets: targets.iter().map(|t| t.destination.clone()).collect(),
                    state: self.destination_state(locked, targets),
                },
            };
            statuses.push(status);
        }

        Ok(statuses)
    }

    /// `missing` wins over `drifted`; a source with every file present and
    /// matching is `synced`.
    fn destination_state(&self, locked: &LockedSource, targets: &[ResolvedTarget]) -> SourceState {
        let mut any_missing = false;
        let mut any_drifted = false;

        for target in targets {
            for (rel, hash) in &locked.resolved.files {
                let abs = self.project_root.join(join_dest(&target.destination, rel));
                match std::fs::read(&abs) {
                    Err(_) => any_missing = true,
                    Ok(content) => {
                        if sha256_hex(&content) != hash.sha256 {
                            any_drifted = true;
                        }
                    }
                }
            }
        }

        if any_missing {
            SourceState::Missing
        } else if any_drifted {
            SourceState::Drifted
        } else {
            SourceState::Synced
        }
    }
}

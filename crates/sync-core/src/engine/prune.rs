//! Prune: remove destination files for sources no longer configured.
//!
//! The lockfile does not record where files were historically written, so
//! prune sweeps the known tool destinations as an approximation and may
//! leave files behind under explicit destinations.

use std::collections::BTreeSet;

use sync_config::lockfile::Lockfile;
use sync_config::model::Config;
use sync_fs::Sandbox;
use sync_source::CancelToken;

use super::{Engine, FileAction, PruneOptions, PruneResult, join_dest};
use crate::Result;

impl Engine<'_> {
    /// Remove orphaned sources' files from every known tool destination.
    /// Per-path removal failures are ignored; dry runs remove nothing.
    pub fn prune(
        &self,
        lockfile: &Lockfile,
        cfg: &Config,
        opts: &PruneOptions,
        cancel: &CancelToken,
    ) -> Result<PruneResult> {
        let mut result = PruneResult::default();

        let tool_map = Self::tool_map(cfg);
        let configured: BTreeSet<&str> = cfg.sources.iter().map(|s| s.name.as_str()).collect();
        let orphaned: Vec<_> = lockfile
            .sources
            .iter()
            .filter(|locked| !configured.contains(locked.name.as_str()))
            .collect();

        if orphaned.is_empty() || opts.dry_run {
            return Ok(result);
        }

        let sandbox = Sandbox::new(&self.project_root)?;
        for locked in orphaned {
            tracing::debug!(source = %locked.name, "pruning files for source removed from configuration");
            for tool in tool_map.known_tools() {
                let Ok(destination) = tool_map.resolve(tool) else {
                    continue;
                };
                for rel in locked.resolved.files.keys() {
                    cancel.check()?;
                    let dest_path = join_dest(destination, rel);
                    if sandbox.remove(&dest_path).is_ok() {
                        result.removed.push(FileAction {
                            path: dest_path,
                            action: "removed".to_string(),
                        });
                    }
                }
            }
        }

        Ok(result)
    }
}

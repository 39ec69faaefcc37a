//! Check: verify destinations against the lockfile without touching
//! upstream or mutating any state.

use sync_config::lockfile::Lockfile;
use sync_config::model::Config;
use sync_fs::checksum::sha256_hex;
use sync_source::CancelToken;

use super::{CheckResult, DriftEntry, Engine, join_dest};
use crate::Result;

impl Engine<'_> {
    /// Compare every (source, target) destination file's hash against the
    /// lockfile. Missing files and hash drifts are reported separately;
    /// `clean` is true only when both lists are empty.
    pub fn check(
        &self,
        lockfile: &Lockfile,
        cfg: &Config,
        cancel: &CancelToken,
    ) -> Result<CheckResult> {
        let tool_map = Self::tool_map(cfg);
        let locked_by_name = Self::locked_by_name(lockfile);

        let mut result = CheckResult {
            clean: true,
            ..Default::default()
        };

        for target in &cfg.targets {
            let resolved_targets = tool_map.resolve_target(target)?;
            let Some(locked) = locked_by_name.get(target.source.as_str()) else {
                continue;
            };

            for resolved_target in &resolved_targets {
                for (rel, hash) in &locked.resolved.files {
                    cancel.check()?;
                    let dest = join_dest(&resolved_target.destination, rel);
                    let abs = self.project_root.join(&dest);

                    match std::fs::read(&abs) {
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                            result.missing.push(dest);
                            result.clean = false;
                        }
                        Err(_) => {}
                        Ok(content) => {
                            let actual = sha256_hex(&content);
                            if actual != hash.sha256 {
                                result.drifted.push(DriftEntry {
                                    path: dest,
                                    expected: hash.sha256.clone(),
                                    actual,
                                });
                                result.clean = false;
                            }
                        }
                    }
                }
            }
        }

        Ok(result)
    }
}

//! Public library facade.

use std::path::{Path, PathBuf};

use sync_config::lockfile::{self, Lockfile};
use sync_config::loader::{self, HierarchicalOptions};
use sync_config::model::Config;
use sync_core::engine::{
    CheckResult, Engine, PruneOptions, PruneResult, SourceFailure, SourceStatus, SyncOptions,
    SyncResult, UpdateOptions, VerifyResult,
};
use sync_core::transform::overrides::validate_override_files;
use sync_core::{Error, Result};
use sync_fs::ContentCache;
use sync_source::{CancelToken, Registry};

/// Configuration for [`Client::new`]. Every field has a sensible default.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Directory containing the destinations. Defaults to the config file's
    /// directory.
    pub project_root: Option<PathBuf>,
    /// Defaults to `agent-sync.yaml` under the project root.
    pub config_path: Option<PathBuf>,
    /// Defaults to `agent-sync.lock` under the project root.
    pub lockfile_path: Option<PathBuf>,
    /// Defaults to the OS cache location.
    pub cache_dir: Option<PathBuf>,
    /// Explicit system config layer; `None` follows the environment.
    pub system_config: Option<PathBuf>,
    /// Explicit user config layer; `None` follows the environment.
    pub user_config: Option<PathBuf>,
    /// Disable hierarchical resolution; `None` follows
    /// `AGENT_SYNC_NO_INHERIT`.
    pub no_inherit: Option<bool>,
}

/// Per-source before/after pin summary from an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSummary {
    pub name: String,
    /// `(new)` for a first-time source.
    pub before: String,
    pub after: String,
}

/// Outcome of [`Client::update`].
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub updated: Vec<UpdateSummary>,
    pub failed: Vec<SourceFailure>,
}

/// Main entry point for embedding agent-sync.
///
/// Bundles the project root, config and lockfile paths, resolver registry,
/// and content cache; exposes one method per operation. Update always
/// auto-confirms: interactive prompting is the embedding CLI's concern.
pub struct Client {
    registry: Registry,
    cache: ContentCache,
    project_root: PathBuf,
    config_path: PathBuf,
    lockfile_path: PathBuf,
    system_config: Option<PathBuf>,
    user_config: Option<PathBuf>,
    no_inherit: Option<bool>,
}

impl Client {
    pub fn new(opts: ClientOptions) -> Result<Self> {
        let config_path = opts
            .config_path
            .unwrap_or_else(|| PathBuf::from(sync_config::discover::CONFIG_FILE_NAME));
        let lockfile_path = opts
            .lockfile_path
            .unwrap_or_else(|| PathBuf::from(lockfile::LOCKFILE_NAME));

        let project_root = match opts.project_root {
            Some(root) => root,
            None => {
                let abs = std::path::absolute(&config_path)
                    .map_err(|e| Error::Fs(sync_fs::Error::io(&config_path, e)))?;
                abs.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."))
            }
        };

        let config_path = absolutize(&project_root, config_path);
        let lockfile_path = absolutize(&project_root, lockfile_path);

        let cache_dir = opts.cache_dir.unwrap_or_else(ContentCache::default_dir);
        let cache = ContentCache::open(cache_dir)?;

        Ok(Self {
            registry: Registry::with_defaults(),
            cache,
            project_root,
            config_path,
            lockfile_path,
            system_config: opts.system_config,
            user_config: opts.user_config,
            no_inherit: opts.no_inherit,
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn lockfile_path(&self) -> &Path {
        &self.lockfile_path
    }

    /// Resolve sources upstream and persist the new lockfile (unless
    /// dry-running).
    pub fn update(&self, opts: &UpdateOptions, cancel: &CancelToken) -> Result<UpdateReport> {
        let cfg = self.load_config()?;
        let current = self.load_lockfile();

        let engine_opts = UpdateOptions {
            auto_confirm: true,
            ..opts.clone()
        };
        let result = self
            .engine()
            .update(&cfg, Some(&current), &engine_opts, cancel)?;

        let report = UpdateReport {
            updated: result
                .updated
                .iter()
                .map(|update| UpdateSummary {
                    name: update.name.clone(),
                    before: update
                        .before
                        .as_ref()
                        .map(|locked| locked.pin_summary())
                        .unwrap_or_else(|| "(new)".to_string()),
                    after: update.after.pin_summary(),
                })
                .collect(),
            failed: result.failed,
        };

        if !opts.dry_run
            && let Some(new_lockfile) = &result.lockfile
        {
            lockfile::save(&self.lockfile_path, new_lockfile).map_err(Error::Config)?;
        }

        Ok(report)
    }

    /// Materialize locked content into destinations. Never modifies the
    /// lockfile.
    pub fn sync(&self, opts: &SyncOptions, cancel: &CancelToken) -> Result<SyncResult> {
        let cfg = self.load_config()?;
        let current = self.load_lockfile();
        self.engine().sync(&current, &cfg, opts, cancel)
    }

    /// Verify destinations against the lockfile. No upstream contact.
    pub fn check(&self, cancel: &CancelToken) -> Result<CheckResult> {
        let cfg = self.load_config()?;
        let current = self.load_lockfile();
        self.engine().check(&current, &cfg, cancel)
    }

    /// Verify the lockfile against upstream. No destination contact.
    pub fn verify(&self, source_names: &[String], cancel: &CancelToken) -> Result<VerifyResult> {
        let cfg = self.load_config()?;
        let current = self.load_lockfile();
        self.engine().verify(&current, &cfg, source_names, cancel)
    }

    /// Remove destination files for sources no longer configured.
    pub fn prune(&self, opts: &PruneOptions, cancel: &CancelToken) -> Result<PruneResult> {
        let cfg = self.load_config()?;
        let current = self.load_lockfile();
        self.engine().prune(&current, &cfg, opts, cancel)
    }

    /// Human-readable per-source state summary.
    pub fn status(
        &self,
        source_names: &[String],
        cancel: &CancelToken,
    ) -> Result<Vec<SourceStatus>> {
        let cfg = self.load_config()?;
        let current = self.load_lockfile();
        self.engine().status(&current, &cfg, source_names, cancel)
    }

    fn engine(&self) -> Engine<'_> {
        Engine {
            registry: &self.registry,
            cache: Some(&self.cache),
            project_root: self.project_root.clone(),
        }
    }

    fn load_config(&self) -> Result<Config> {
        let result = loader::load_hierarchical(&HierarchicalOptions {
            project_path: self.config_path.clone(),
            system_config: self.system_config.clone(),
            user_config: self.user_config.clone(),
            no_inherit: self
                .no_inherit
                .unwrap_or_else(sync_config::discover::no_inherit_from_env),
        })
        .map_err(Error::Config)?;

        validate_override_files(&self.project_root, &result.config.overrides)?;
        Ok(result.config)
    }

    /// A missing or unreadable lockfile reads as empty; update rebuilds it.
    fn load_lockfile(&self) -> Lockfile {
        match lockfile::load(&self.lockfile_path) {
            Ok(current) => current,
            Err(e) => {
                tracing::debug!(path = %self.lockfile_path.display(), error = %e, "starting from an empty lockfile");
                Lockfile::default()
            }
        }
    }
}

fn absolutize(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        root.join(path)
    } else {
        path
    }
}

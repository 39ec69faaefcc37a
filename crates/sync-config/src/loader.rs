//! Loading, merging, and validating layered configuration.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::discover::{ConfigLayer, ConfigLevel, DiscoverOptions, discover_layers};
use crate::merge::merge_all;
use crate::model::{Config, Source};
use crate::{Error, Result};

/// Read a config file without validation.
///
/// Partial layers (system, user) are legal on their own; only the merged
/// composite must validate.
pub fn parse(path: &Path) -> Result<Config> {
    let data = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_yaml::from_str(&data).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read and validate a single config file.
pub fn load(path: &Path) -> Result<Config> {
    let cfg = parse(path)?;
    let errors = validate(&cfg);
    if !errors.is_empty() {
        return Err(Error::Validation { errors });
    }
    Ok(cfg)
}

/// Options for hierarchical config loading.
#[derive(Debug, Clone, Default)]
pub struct HierarchicalOptions {
    /// Project-level config path (required).
    pub project_path: PathBuf,
    /// Explicit system config path; `None` uses environment/OS defaults.
    pub system_config: Option<PathBuf>,
    /// Explicit user config path; `None` uses environment/OS defaults.
    pub user_config: Option<PathBuf>,
    /// Load only the project layer.
    pub no_inherit: bool,
}

/// The merged config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct HierarchicalResult {
    pub config: Config,
    pub layers: Vec<ConfigLayer>,
}

/// Discover, parse, merge, and validate configs from the system, user, and
/// project levels.
///
/// Missing system/user configs are silently skipped. A missing project
/// config is fatal, as is any layer that exists but fails to parse, and any
/// permission failure. Version mismatches across layers are fatal.
pub fn load_hierarchical(opts: &HierarchicalOptions) -> Result<HierarchicalResult> {
    if opts.no_inherit {
        let config = load(&opts.project_path)?;
        return Ok(HierarchicalResult {
            config,
            layers: vec![ConfigLayer {
                path: opts.project_path.clone(),
                level: ConfigLevel::Project,
                loaded: true,
            }],
        });
    }

    let mut layers = discover_layers(&DiscoverOptions {
        project_path: opts.project_path.clone(),
        system_config: opts.system_config.clone(),
        user_config: opts.user_config.clone(),
    });

    let mut configs = Vec::new();
    for layer in &mut layers {
        let data = match std::fs::read_to_string(&layer.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if layer.level == ConfigLevel::Project {
                    return Err(Error::NotFound {
                        path: layer.path.clone(),
                    });
                }
                tracing::debug!(path = %layer.path.display(), level = %layer.level, "config layer absent, skipping");
                continue;
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(Error::PermissionDenied {
                    level: layer.level,
                    path: layer.path.clone(),
                });
            }
            Err(e) => {
                return Err(Error::Read {
                    path: layer.path.clone(),
                    source: e,
                });
            }
        };

        let cfg: Config = serde_yaml::from_str(&data).map_err(|e| Error::Parse {
            path: layer.path.clone(),
            message: e.to_string(),
        })?;
        layer.loaded = true;
        configs.push(cfg);
    }

    if configs.is_empty() {
        return Err(Error::NotFound {
            path: opts.project_path.clone(),
        });
    }

    let merged = merge_all(configs)?;
    let errors = validate(&merged);
    if !errors.is_empty() {
        return Err(Error::Validation { errors });
    }

    Ok(HierarchicalResult {
        config: merged,
        layers,
    })
}

/// Check a config for semantic correctness.
///
/// Returns every violation, each naming the offending entry and how to fix
/// it.
pub fn validate(cfg: &Config) -> Vec<String> {
    let mut errors = Vec::new();

    if cfg.version != 1 {
        errors.push(format!(
            "unsupported version {}; only version 1 is supported",
            cfg.version
        ));
    }

    if cfg.sources.is_empty() {
        errors.push("at least one source is required".to_string());
    }

    let mut source_names = Vec::new();
    for (i, source) in cfg.sources.iter().enumerate() {
        let label = if source.name.is_empty() {
            format!("source[{i}]")
        } else {
            format!("source '{}'", source.name)
        };

        if source.name.is_empty() {
            errors.push(format!("{label}: 'name' is required"));
        } else if source_names.contains(&source.name.as_str()) {
            errors.push(format!("{label}: duplicate source name '{}'", source.name));
        } else {
            source_names.push(source.name.as_str());
        }

        validate_source(source, &label, &mut errors);
    }

    for (i, target) in cfg.targets.iter().enumerate() {
        let label = if target.source.is_empty() {
            format!("target[{i}]")
        } else {
            format!("target for source '{}'", target.source)
        };

        if target.source.is_empty() {
            errors.push(format!("{label}: 'source' is required"));
        } else if !source_names.contains(&target.source.as_str()) {
            errors.push(format!(
                "{label}: references undefined source '{}'",
                target.source
            ));
        }

        if !target.tools.is_empty() && !target.destination.is_empty() {
            errors.push(format!(
                "{label}: 'tools' and 'destination' are mutually exclusive; use one or the other"
            ));
        }
        if target.tools.is_empty() && target.destination.is_empty() {
            errors.push(format!(
                "{label}: one of 'tools' or 'destination' is required"
            ));
        }
    }

    for (i, ov) in cfg.overrides.iter().enumerate() {
        let label = if ov.target.is_empty() {
            format!("override[{i}]")
        } else {
            format!("override for '{}'", ov.target)
        };

        if ov.target.is_empty() {
            errors.push(format!("{label}: 'target' is required"));
        }
        if ov.file.is_empty() {
            errors.push(format!("{label}: 'file' is required"));
        }

        match ov.strategy.as_str() {
            "append" | "prepend" | "replace" => {}
            "" => errors.push(format!(
                "{label}: 'strategy' is required; must be one of: append, prepend, replace"
            )),
            other => errors.push(format!(
                "{label}: invalid strategy '{other}'; must be one of: append, prepend, replace"
            )),
        }
    }

    for (i, tx) in cfg.transforms.iter().enumerate() {
        let label = if tx.source.is_empty() {
            format!("transform[{i}]")
        } else {
            format!("transform for source '{}'", tx.source)
        };

        if tx.source.is_empty() {
            errors.push(format!("{label}: 'source' is required"));
        } else if !source_names.contains(&tx.source.as_str()) {
            errors.push(format!(
                "{label}: references undefined source '{}'",
                tx.source
            ));
        }

        match tx.kind.as_str() {
            "template" => {}
            "custom" => {
                if tx.command.is_empty() {
                    errors.push(format!("{label}: custom transform requires 'command'"));
                }
            }
            "" => errors.push(format!(
                "{label}: 'type' is required; must be one of: template, custom"
            )),
            other => errors.push(format!(
                "{label}: invalid type '{other}'; must be one of: template, custom"
            )),
        }
    }

    for (i, td) in cfg.tool_definitions.iter().enumerate() {
        let label = format!("tool_definition[{i}]");
        if td.name.is_empty() {
            errors.push(format!("{label}: 'name' is required"));
        }
        if td.destination.is_empty() {
            errors.push(format!("{label}: 'destination' is required"));
        }
    }

    errors
}

fn validate_source(source: &Source, label: &str, errors: &mut Vec<String>) {
    match source.kind.as_str() {
        "git" => {
            if source.repo.is_empty() {
                errors.push(format!(
                    "{label}: type 'git' requires 'repo'; add 'repo: https://...' to the source definition"
                ));
            }
            if source.git_ref.is_empty() {
                errors.push(format!(
                    "{label}: type 'git' requires 'ref'; add 'ref: <tag-or-branch>' to the source definition"
                ));
            }
        }
        "url" => {
            if source.url.is_empty() {
                errors.push(format!(
                    "{label}: type 'url' requires 'url'; add 'url: https://...' to the source definition"
                ));
            }
            if source.checksum.is_empty() {
                errors.push(format!(
                    "{label}: type 'url' requires 'checksum'; add 'checksum: sha256:<hex>' to the source definition"
                ));
            }
        }
        "local" => {
            if source.path.is_empty() {
                errors.push(format!(
                    "{label}: type 'local' requires 'path'; add 'path: ./relative/path/' to the source definition"
                ));
            }
        }
        "" => errors.push(format!(
            "{label}: 'type' is required; must be one of: git, url, local"
        )),
        other => errors.push(format!(
            "{label}: unknown source type '{other}'; must be one of: git, url, local"
        )),
    }
}

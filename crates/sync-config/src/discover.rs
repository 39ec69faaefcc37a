//! Config layer discovery across system, user, and project levels.

use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "agent-sync.yaml";
pub const CONFIG_DIR_NAME: &str = "agent-sync";

pub const ENV_SYSTEM_CONFIG: &str = "AGENT_SYNC_SYSTEM_CONFIG";
pub const ENV_USER_CONFIG: &str = "AGENT_SYNC_USER_CONFIG";
pub const ENV_NO_INHERIT: &str = "AGENT_SYNC_NO_INHERIT";

/// Precedence level of a configuration file, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    System,
    User,
    Project,
}

impl std::fmt::Display for ConfigLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConfigLevel::System => "system",
            ConfigLevel::User => "user",
            ConfigLevel::Project => "project",
        };
        write!(f, "{s}")
    }
}

/// A discovered config file and its load status.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub path: PathBuf,
    pub level: ConfigLevel,
    pub loaded: bool,
}

/// Controls how config paths are discovered.
#[derive(Debug, Clone, Default)]
pub struct DiscoverOptions {
    /// Project-level config path (required; highest precedence).
    pub project_path: PathBuf,
    /// Explicit system config path. `None` consults the environment, then
    /// the OS default.
    pub system_config: Option<PathBuf>,
    /// Explicit user config path. `None` consults the environment, then the
    /// OS default.
    pub user_config: Option<PathBuf>,
}

/// Ordered list of config paths to check, lowest precedence first,
/// deduplicated by absolute path.
pub fn discover_layers(opts: &DiscoverOptions) -> Vec<ConfigLayer> {
    let mut layers = Vec::new();
    let mut seen: Vec<PathBuf> = Vec::new();

    add_layer(
        &mut layers,
        &mut seen,
        ConfigLevel::System,
        system_config_path(opts.system_config.as_deref()),
    );
    add_layer(
        &mut layers,
        &mut seen,
        ConfigLevel::User,
        user_config_path(opts.user_config.as_deref()),
    );
    add_layer(
        &mut layers,
        &mut seen,
        ConfigLevel::Project,
        Some(opts.project_path.clone()),
    );

    layers
}

fn add_layer(
    layers: &mut Vec<ConfigLayer>,
    seen: &mut Vec<PathBuf>,
    level: ConfigLevel,
    path: Option<PathBuf>,
) {
    let Some(path) = path else { return };
    if path.as_os_str().is_empty() {
        return;
    }
    let abs = std::path::absolute(&path).unwrap_or_else(|_| path.clone());
    if seen.contains(&abs) {
        return;
    }
    seen.push(abs);
    layers.push(ConfigLayer {
        path,
        level,
        loaded: false,
    });
}

/// System config path: explicit override, then `AGENT_SYNC_SYSTEM_CONFIG`,
/// then the platform default.
pub fn system_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_path(ENV_SYSTEM_CONFIG) {
        return Some(path);
    }
    Some(default_system_config_path())
}

/// User config path: explicit override, then `AGENT_SYNC_USER_CONFIG`, then
/// the OS user config directory.
pub fn user_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_path(ENV_USER_CONFIG) {
        return Some(path);
    }
    directories::BaseDirs::new()
        .map(|base| base.config_dir().join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// True when `AGENT_SYNC_NO_INHERIT` is set to `1` or `true`.
pub fn no_inherit_from_env() -> bool {
    env_bool_true(ENV_NO_INHERIT)
}

#[cfg(windows)]
fn default_system_config_path() -> PathBuf {
    let program_data =
        std::env::var("ProgramData").unwrap_or_else(|_| r"C:\ProgramData".to_string());
    PathBuf::from(program_data)
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

#[cfg(not(windows))]
fn default_system_config_path() -> PathBuf {
    PathBuf::from("/etc")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

fn env_path(key: &str) -> Option<PathBuf> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

fn env_bool_true(key: &str) -> bool {
    matches!(
        std::env::var(key)
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true"
    )
}

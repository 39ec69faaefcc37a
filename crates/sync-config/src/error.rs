//! Error types for sync-config

use std::path::PathBuf;

use crate::discover::ConfigLevel;

/// Result type for sync-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sync-config operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("serializing {path}: {message}")]
    Serialize { path: PathBuf, message: String },

    #[error("project config {path} not found; create it or point the loader at an explicit path")]
    NotFound { path: PathBuf },

    #[error("{level} config {path}: permission denied")]
    PermissionDenied { level: ConfigLevel, path: PathBuf },

    #[error(
        "config version mismatch: one layer declares version {base}, another declares version {overlay}; all config layers must agree on version"
    )]
    VersionMismatch { base: u32, overlay: u32 },

    #[error("no config layers to merge")]
    NoLayers,

    #[error("config validation failed:\n  - {}", .errors.join("\n  - "))]
    Validation { errors: Vec<String> },

    #[error("lockfile validation failed:\n  - {}", .errors.join("\n  - "))]
    LockfileValidation { errors: Vec<String> },

    #[error(
        "unknown tool '{name}'; define it in tool_definitions: [{{name: {name}, destination: .{name}/}}]"
    )]
    UnknownTool { name: String },

    #[error(
        "target for source '{source_path}': 'tools' and 'destination' are mutually exclusive; use one or the other"
    )]
    TargetConflict { source_path: String },

    #[error("target for source '{source_path}': one of 'tools' or 'destination' is required")]
    TargetEmpty { source_path: String },

    #[error(transparent)]
    Fs(#[from] sync_fs::Error),
}

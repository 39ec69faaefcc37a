//! Error types for sync-fs

use std::path::PathBuf;

/// Result type for sync-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sync-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid sandbox root {path}: not an existing directory")]
    InvalidRoot { path: PathBuf },

    #[error("path '{path}' resolves to '{resolved}' which is outside the project root '{root}'")]
    PathEscape {
        path: PathBuf,
        resolved: PathBuf,
        root: PathBuf,
    },

    #[error("invalid checksum '{value}': expected 'algorithm:hex' (e.g. 'sha256:abcdef...')")]
    MalformedChecksum { value: String },

    #[error("cache entry {key}: content hashes to {actual}, refusing to store")]
    KeyMismatch { key: String, actual: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

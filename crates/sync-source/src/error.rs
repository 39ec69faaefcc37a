//! Error types for sync-source

use crate::cancel::Cancelled;

/// Result type for sync-source operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or fetching sources.
///
/// Messages lead with the source name so batch reports stay readable, and
/// user-correctable failures carry their remediation inline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{source_name}: {field} is required; {hint}")]
    MissingField {
        source_name: String,
        field: &'static str,
        hint: &'static str,
    },

    #[error("unknown source type '{kind}'; supported types: {supported}")]
    UnknownKind { kind: String, supported: String },

    #[error("{source_name}: git {operation} failed: {stderr}")]
    Git {
        source_name: String,
        operation: String,
        stderr: String,
    },

    #[error("{source_name}: fetching {url}: {message}; check network connectivity and the URL")]
    Http {
        source_name: String,
        url: String,
        message: String,
    },

    #[error(
        "{source_name}: HTTP {status} from {url}; check that the URL is accessible and returns the expected content"
    )]
    HttpStatus {
        source_name: String,
        status: u16,
        url: String,
    },

    #[error("{source_name}: response from {url} exceeds the {limit} byte limit; use a smaller file or raise the limit")]
    TooLarge {
        source_name: String,
        url: String,
        limit: u64,
    },

    #[error("{source_name}: unsupported checksum algorithm '{algo}'; only 'sha256' is supported")]
    UnsupportedAlgorithm { source_name: String, algo: String },

    #[error(
        "{source_name}: checksum mismatch: expected {expected}, got {actual}; the upstream content has changed, update the checksum in your config"
    )]
    ChecksumMismatch {
        source_name: String,
        expected: String,
        actual: String,
    },

    #[error(
        "{source_name}: hash mismatch for {path}: expected {expected}, got {actual}; the content changed since the lockfile was written, run update to re-lock"
    )]
    HashMismatch {
        source_name: String,
        path: String,
        expected: String,
        actual: String,
    },

    #[error("{source_name}: path '{path}' resolves outside the project root")]
    OutsideRoot { source_name: String, path: String },

    #[error("{source_name}: no files found at '{path}'; the path exists but contains no files")]
    EmptySource { source_name: String, path: String },

    #[error("{source_name}: {context}: {source}")]
    Io {
        source_name: String,
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fs(#[from] sync_fs::Error),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

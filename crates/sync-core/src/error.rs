//! Error types for sync-core

/// Result type for sync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the transform pipeline and operations engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("template parse error in {file}: {message}")]
    TemplateParse { file: String, message: String },

    #[error(
        "template variable '{name}' is not defined (referenced from {file}); define it under 'variables' or in the transform's 'vars'"
    )]
    MissingVariable { file: String, name: String },

    #[error(
        "override for '{target}': no synced file matches this name; check that a source produces it"
    )]
    OverrideTargetMissing { target: String },

    #[error("override for '{target}': file '{file}' does not exist; create it or remove the override")]
    OverrideFileMissing { target: String, file: String },

    #[error("override for '{target}': reading '{file}': {source}")]
    OverrideRead {
        target: String,
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("override for '{target}': invalid strategy '{strategy}'; must be one of: append, prepend, replace")]
    InvalidStrategy { target: String, strategy: String },

    #[error(
        "conflict: multiple sources target '{destination}' ({sources}); add an override for that file or point the sources at different destinations"
    )]
    DestinationConflict {
        destination: String,
        sources: String,
    },

    #[error("source '{name}' not found in config; check the 'sources' list")]
    UnknownSource { name: String },

    #[error(
        "{source_name}: file '{path}' is listed in the lockfile but was not produced by fetch; run update to re-lock"
    )]
    MissingLockedFile { source_name: String, path: String },

    #[error(transparent)]
    Fs(#[from] sync_fs::Error),

    #[error(transparent)]
    Config(#[from] sync_config::Error),

    #[error(transparent)]
    Source(#[from] sync_source::Error),

    #[error(transparent)]
    Cancelled(#[from] sync_source::Cancelled),
}

impl Error {
    /// Whether this error (or its cause) is a cancellation, which must abort
    /// the whole operation instead of being collected per source.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Error::Cancelled(_) | Error::Source(sync_source::Error::Cancelled(_))
        )
    }
}

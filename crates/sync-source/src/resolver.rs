//! Resolver contract and registry.

use std::collections::BTreeMap;
use std::path::Path;

use sync_config::model::Source;

use crate::cancel::CancelToken;
use crate::{Error, GitResolver, LocalResolver, Result, UrlResolver};

/// The immutable identity of a resolved source plus its file hash map.
///
/// Every file referenced by any downstream step appears in `files`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSource {
    pub name: String,
    pub kind: String,
    /// git only: authoritative commit hash.
    pub commit: String,
    /// git only: tree hash.
    pub tree: String,
    /// url only.
    pub url: String,
    /// git only.
    pub repo: String,
    /// local only: base path relative to the project root.
    pub path: String,
    /// Relative path to SHA-256 hex digest for every included file.
    pub files: BTreeMap<String, String>,
}

/// Content of a single fetched file, verified against the resolved record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub rel_path: String,
    pub sha256: String,
    pub content: Vec<u8>,
}

/// Resolve/Fetch capability shared by all source kinds.
pub trait SourceResolver: Send + Sync {
    /// Resolve a source spec to its current upstream state. Must not write
    /// to any destination.
    fn resolve(
        &self,
        spec: &Source,
        project_root: &Path,
        cancel: &CancelToken,
    ) -> Result<ResolvedSource>;

    /// Retrieve content for a previously resolved source. Returned bytes
    /// must hash to the resolved record's digests; a mismatch is fatal for
    /// the source.
    fn fetch(
        &self,
        resolved: &ResolvedSource,
        project_root: &Path,
        cancel: &CancelToken,
    ) -> Result<Vec<FetchedFile>>;
}

/// Maps source kind strings to resolver implementations.
#[derive(Default)]
pub struct Registry {
    resolvers: BTreeMap<String, Box<dyn SourceResolver>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the git, url, and local resolvers registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("git", Box::new(GitResolver));
        registry.register("url", Box::new(UrlResolver::default()));
        registry.register("local", Box::new(LocalResolver));
        registry
    }

    pub fn register(&mut self, kind: impl Into<String>, resolver: Box<dyn SourceResolver>) {
        self.resolvers.insert(kind.into(), resolver);
    }

    pub fn get(&self, kind: &str) -> Result<&dyn SourceResolver> {
        self.resolvers
            .get(kind)
            .map(Box::as_ref)
            .ok_or_else(|| Error::UnknownKind {
                kind: kind.to_string(),
                supported: if self.resolvers.is_empty() {
                    "(none registered)".to_string()
                } else {
                    self.supported_kinds().join(", ")
                },
            })
    }

    /// Registered kind strings, sorted.
    pub fn supported_kinds(&self) -> Vec<&str> {
        self.resolvers.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_knows_all_three_kinds() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.supported_kinds(), vec!["git", "local", "url"]);
        assert!(registry.get("local").is_ok());
    }

    #[test]
    fn unknown_kind_error_lists_supported_kinds() {
        let registry = Registry::with_defaults();
        let err = match registry.get("ftp") {
            Err(err) => err,
            Ok(_) => panic!("expected an error"),
        };
        let message = err.to_string();
        assert!(message.contains("ftp"));
        assert!(message.contains("git, local, url"));
    }

    #[test]
    fn empty_registry_reports_none_registered() {
        let registry = Registry::new();
        let err = match registry.get("git") {
            Err(err) => err,
            Ok(_) => panic!("expected an error"),
        };
        assert!(err.to_string().contains("(none registered)"));
    }
}

//! Local directory and file sources.
//!
//! Paths resolve relative to the project root and may never reach outside
//! it; the same containment rule as the sandbox applies to ingestion.

use std::collections::BTreeMap;
use std::path::Path;

use sync_config::model::Source;
use sync_fs::Sandbox;
use sync_fs::checksum::{hash_file, sha256_hex};

use crate::cancel::CancelToken;
use crate::resolver::{FetchedFile, ResolvedSource, SourceResolver};
use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct LocalResolver;

impl SourceResolver for LocalResolver {
    fn resolve(
        &self,
        spec: &Source,
        project_root: &Path,
        cancel: &CancelToken,
    ) -> Result<ResolvedSource> {
        if spec.path.is_empty() {
            return Err(Error::MissingField {
                source_name: spec.name.clone(),
                field: "path",
                hint: "add 'path: ./relative/path/' to the source definition",
            });
        }

        let base = contained_path(&spec.name, project_root, &spec.path)?;
        let meta = std::fs::metadata(&base).map_err(|e| Error::Io {
            source_name: spec.name.clone(),
            context: format!("stat {}; check that the path exists", spec.path),
            source: e,
        })?;

        let mut files = BTreeMap::new();
        if meta.is_file() {
            cancel.check()?;
            let rel = base
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| spec.path.clone());
            files.insert(rel, hash_file(&base)?);
        } else {
            let walker = walkdir::WalkDir::new(&base)
                .into_iter()
                .filter_entry(|entry| entry.path() == base || !is_hidden(entry));
            for entry in walker {
                let entry = entry.map_err(|e| Error::Io {
                    source_name: spec.name.clone(),
                    context: format!("walking {}", spec.path),
                    source: e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                cancel.check()?;
                let rel = entry.path().strip_prefix(&base).unwrap_or(entry.path());
                let rel_str = rel.to_string_lossy().replace('\\', "/");
                files.insert(rel_str, hash_file(entry.path())?);
            }
        }

        if files.is_empty() {
            return Err(Error::EmptySource {
                source_name: spec.name.clone(),
                path: spec.path.clone(),
            });
        }

        Ok(ResolvedSource {
            name: spec.name.clone(),
            kind: "local".to_string(),
            path: spec.path.clone(),
            files,
            ..Default::default()
        })
    }

    fn fetch(
        &self,
        resolved: &ResolvedSource,
        project_root: &Path,
        cancel: &CancelToken,
    ) -> Result<Vec<FetchedFile>> {
        if resolved.path.is_empty() {
            return Err(Error::MissingField {
                source_name: resolved.name.clone(),
                field: "path",
                hint: "the lockfile entry has no path; run update to re-lock",
            });
        }

        let base = contained_path(&resolved.name, project_root, &resolved.path)?;
        let meta = std::fs::metadata(&base).map_err(|e| Error::Io {
            source_name: resolved.name.clone(),
            context: format!("stat {}", resolved.path),
            source: e,
        })?;

        let mut fetched = Vec::with_capacity(resolved.files.len());
        for (rel_path, expected) in &resolved.files {
            cancel.check()?;
            let abs = if meta.is_dir() {
                base.join(rel_path)
            } else {
                base.clone()
            };

            let content = std::fs::read(&abs).map_err(|e| Error::Io {
                source_name: resolved.name.clone(),
                context: format!("reading {rel_path}"),
                source: e,
            })?;

            let actual = sha256_hex(&content);
            if &actual != expected {
                return Err(Error::HashMismatch {
                    source_name: resolved.name.clone(),
                    path: rel_path.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }

            fetched.push(FetchedFile {
                rel_path: rel_path.clone(),
                sha256: actual,
                content,
            });
        }

        Ok(fetched)
    }
}

/// Resolve a source path against the project root, rejecting escapes with
/// the sandbox's containment rule.
fn contained_path(
    source_name: &str,
    project_root: &Path,
    rel: &str,
) -> Result<std::path::PathBuf> {
    let sandbox = Sandbox::new(project_root)?;
    match sandbox.validate(rel) {
        Ok(path) => Ok(path),
        Err(sync_fs::Error::PathEscape { .. }) => Err(Error::OutsideRoot {
            source_name: source_name.to_string(),
            path: rel.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

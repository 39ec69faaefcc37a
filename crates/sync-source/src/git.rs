//! Git source resolution via the git CLI.
//!
//! Clones land in throwaway temp directories with terminal prompts disabled;
//! stderr from failed invocations is surfaced to the caller. Resolution
//! records the HEAD commit and tree hashes and hashes every non-hidden file
//! under the requested path filters.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Output};

use sync_config::model::Source;
use sync_fs::checksum::hash_file;

use crate::cancel::CancelToken;
use crate::resolver::{FetchedFile, ResolvedSource, SourceResolver};
use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct GitResolver;

impl SourceResolver for GitResolver {
    fn resolve(
        &self,
        spec: &Source,
        _project_root: &Path,
        cancel: &CancelToken,
    ) -> Result<ResolvedSource> {
        if spec.repo.is_empty() {
            return Err(Error::MissingField {
                source_name: spec.name.clone(),
                field: "repo",
                hint: "add 'repo: https://...' to the source definition",
            });
        }
        if spec.git_ref.is_empty() {
            return Err(Error::MissingField {
                source_name: spec.name.clone(),
                field: "ref",
                hint: "add 'ref: <tag-or-branch>' to the source definition",
            });
        }

        let tmp = temp_clone_dir(&spec.name)?;
        clone_at_ref(&spec.name, &spec.repo, &spec.git_ref, tmp.path(), cancel)?;

        let commit = rev_parse(&spec.name, tmp.path(), "HEAD", cancel)?;
        let tree = rev_parse(&spec.name, tmp.path(), "HEAD^{tree}", cancel)?;
        let files = hash_tree(&spec.name, tmp.path(), &spec.paths, cancel)?;

        Ok(ResolvedSource {
            name: spec.name.clone(),
            kind: "git".to_string(),
            commit,
            tree,
            repo: spec.repo.clone(),
            files,
            ..Default::default()
        })
    }

    fn fetch(
        &self,
        resolved: &ResolvedSource,
        _project_root: &Path,
        cancel: &CancelToken,
    ) -> Result<Vec<FetchedFile>> {
        if resolved.repo.is_empty() {
            return Err(Error::MissingField {
                source_name: resolved.name.clone(),
                field: "repo",
                hint: "the lockfile entry has no repo URL; run update to re-lock",
            });
        }

        let tmp = temp_clone_dir(&resolved.name)?;
        clone_at_commit(
            &resolved.name,
            &resolved.repo,
            &resolved.commit,
            tmp.path(),
            cancel,
        )?;

        let mut fetched = Vec::with_capacity(resolved.files.len());
        for (rel_path, expected) in &resolved.files {
            cancel.check()?;
            let abs = tmp.path().join(rel_path);
            let content = std::fs::read(&abs).map_err(|e| Error::Io {
                source_name: resolved.name.clone(),
                context: format!("reading {rel_path}"),
                source: e,
            })?;

            let actual = sync_fs::checksum::sha256_hex(&content);
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

fn temp_clone_dir(source_name: &str) -> Result<tempfile::TempDir> {
    tempfile::tempdir().map_err(|e| Error::Io {
        source_name: source_name.to_string(),
        context: "creating temp clone directory".to_string(),
        source: e,
    })
}

/// Shallow single-branch clone at `git_ref`; a ref that is not a valid
/// branch argument (e.g. a commit SHA) falls back to a full clone plus
/// checkout.
fn clone_at_ref(
    source_name: &str,
    repo: &str,
    git_ref: &str,
    dest: &Path,
    cancel: &CancelToken,
) -> Result<()> {
    let dest_str = dest.to_string_lossy();
    let output = run_git(
        source_name,
        &[
            "clone",
            "--depth",
            "1",
            "--branch",
            git_ref,
            "--single-branch",
            repo,
            &dest_str,
        ],
        cancel,
    )?;
    if output.status.success() {
        return Ok(());
    }

    let shallow_stderr = stderr_of(&output);
    tracing::debug!(
        source = source_name,
        git_ref,
        "shallow clone failed, falling back to full clone"
    );

    let fallback = run_git(
        source_name,
        &["clone", "--no-checkout", repo, &dest_str],
        cancel,
    )?;
    if !fallback.status.success() {
        return Err(Error::Git {
            source_name: source_name.to_string(),
            operation: "clone".to_string(),
            stderr: shallow_stderr,
        });
    }

    checkout(source_name, dest, git_ref, cancel)
}

fn clone_at_commit(
    source_name: &str,
    repo: &str,
    commit: &str,
    dest: &Path,
    cancel: &CancelToken,
) -> Result<()> {
    let dest_str = dest.to_string_lossy();
    let output = run_git(
        source_name,
        &["clone", "--no-checkout", repo, &dest_str],
        cancel,
    )?;
    if !output.status.success() {
        return Err(Error::Git {
            source_name: source_name.to_string(),
            operation: "clone".to_string(),
            stderr: stderr_of(&output),
        });
    }
    checkout(source_name, dest, commit, cancel)
}

fn checkout(source_name: &str, repo_dir: &Path, rev: &str, cancel: &CancelToken) -> Result<()> {
    let dir = repo_dir.to_string_lossy();
    let output = run_git(source_name, &["-C", &dir, "checkout", rev], cancel)?;
    if !output.status.success() {
        return Err(Error::Git {
            source_name: source_name.to_string(),
            operation: format!("checkout {rev}"),
            stderr: stderr_of(&output),
        });
    }
    Ok(())
}

fn rev_parse(source_name: &str, repo_dir: &Path, rev: &str, cancel: &CancelToken) -> Result<String> {
    let dir = repo_dir.to_string_lossy();
    let output = run_git(source_name, &["-C", &dir, "rev-parse", rev], cancel)?;
    if !output.status.success() {
        return Err(Error::Git {
            source_name: source_name.to_string(),
            operation: format!("rev-parse {rev}"),
            stderr: stderr_of(&output),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn run_git(source_name: &str, args: &[&str], cancel: &CancelToken) -> Result<Output> {
    cancel.check()?;
    Command::new("git")
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|e| Error::Io {
            source_name: source_name.to_string(),
            context: "invoking git".to_string(),
            source: e,
        })
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Hash every non-hidden file under the requested path filters. A filter
/// naming a single file is hashed directly; a filter absent from the clone
/// is skipped.
fn hash_tree(
    source_name: &str,
    repo_dir: &Path,
    paths: &[String],
    cancel: &CancelToken,
) -> Result<BTreeMap<String, String>> {
    let filters: Vec<&str> = if paths.is_empty() {
        vec!["."]
    } else {
        paths.iter().map(String::as_str).collect()
    };

    let mut files = BTreeMap::new();
    for filter in filters {
        let walk_root = repo_dir.join(filter);
        let Ok(meta) = std::fs::metadata(&walk_root) else {
            continue;
        };

        if meta.is_file() {
            cancel.check()?;
            files.insert(
                filter.trim_start_matches("./").to_string(),
                hash_file(&walk_root)?,
            );
            continue;
        }

        let walker = walkdir::WalkDir::new(&walk_root)
            .into_iter()
            .filter_entry(|entry| entry.path() == walk_root || !is_hidden(entry));
        for entry in walker {
            let entry = entry.map_err(|e| walk_error(source_name, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            cancel.check()?;
            let rel = entry.path().strip_prefix(repo_dir).unwrap_or(entry.path());
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            files.insert(rel_str, hash_file(entry.path())?);
        }
    }

    Ok(files)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn walk_error(source_name: &str, error: walkdir::Error) -> Error {
    Error::Io {
        source_name: source_name.to_string(),
        context: "walking clone".to_string(),
        source: error
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
    }
}

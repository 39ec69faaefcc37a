//! Root-confined filesystem operations
//!
//! Every mutation is validated against the project root after symlink
//! resolution, then performed with the tempfile-plus-rename discipline so a
//! destination is never left half-written.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Validated, atomic writes confined to a root directory.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Create a sandbox rooted at `root`.
    ///
    /// The root must be an existing directory. It is canonicalized up front
    /// so containment checks compare against its real path.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|_| Error::InvalidRoot {
            path: root.to_path_buf(),
        })?;
        if !canonical.is_dir() {
            return Err(Error::InvalidRoot {
                path: root.to_path_buf(),
            });
        }
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `rel` against the root and verify containment.
    ///
    /// The longest existing prefix of the candidate path is resolved through
    /// symlinks before the check, so a symlinked parent cannot smuggle the
    /// final path outside the root. Containment is component-wise: the
    /// result must equal the root or live under `root` + separator, which
    /// keeps `rootX` from matching `root`.
    pub fn validate(&self, rel: impl AsRef<Path>) -> Result<PathBuf> {
        let rel = rel.as_ref();
        let candidate = normalize(&self.root.join(rel));
        let resolved = resolve_existing_prefix(&candidate);

        if resolved != self.root && !resolved.starts_with(&self.root) {
            return Err(Error::PathEscape {
                path: rel.to_path_buf(),
                resolved,
                root: self.root.clone(),
            });
        }
        Ok(resolved)
    }

    /// Atomically write `content` to `rel` inside the root.
    ///
    /// The parent directory chain is created as needed. The temporary file
    /// lives in the destination's directory so the rename is atomic on the
    /// same filesystem; it is removed on any failure.
    pub fn write(&self, rel: impl AsRef<Path>, content: &[u8], mode: u32) -> Result<()> {
        let rel = rel.as_ref();
        let resolved = self.validate(rel)?;
        if let Some(parent_rel) = rel.parent()
            && !parent_rel.as_os_str().is_empty()
        {
            self.validate(parent_rel)?;
        }

        let dir = resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| Error::io(&dir, e))?;
        tmp.write_all(content)
            .map_err(|e| Error::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| Error::io(tmp.path(), e))?;
        set_mode(tmp.as_file(), tmp.path(), mode)?;
        tmp.persist(&resolved)
            .map_err(|e| Error::io(&resolved, e.error))?;
        Ok(())
    }

    /// Remove a file inside the root.
    pub fn remove(&self, rel: impl AsRef<Path>) -> Result<()> {
        let resolved = self.validate(rel)?;
        fs::remove_file(&resolved).map_err(|e| Error::io(&resolved, e))
    }

    /// Create a directory chain inside the root.
    pub fn mkdir_all(&self, rel: impl AsRef<Path>) -> Result<()> {
        let resolved = self.validate(rel)?;
        fs::create_dir_all(&resolved).map_err(|e| Error::io(&resolved, e))
    }
}

/// Lexically normalize a path: drop `.` components and apply `..` against
/// the preceding component.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Resolve symlinks for the longest existing prefix of `path`, then append
/// the non-existing suffix. Handles destinations that do not exist yet.
fn resolve_existing_prefix(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    resolve_existing_prefix(parent).join(name)
}

#[cfg(unix)]
fn set_mode(file: &fs::File, path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
        .map_err(|e| Error::io(path, e))
}

#[cfg(not(unix))]
fn set_mode(_file: &fs::File, _path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

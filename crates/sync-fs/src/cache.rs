//! Content-addressed blob storage
//!
//! Blobs are keyed by their SHA-256 digest and re-verified on every read; a
//! corrupt entry is deleted and reported as a miss so the caller re-fetches
//! from upstream. Entries are immutable, which makes concurrent writers safe:
//! whoever renames last wins with identical content.

use std::fs;
use std::path::{Path, PathBuf};

use crate::checksum::sha256_hex;
use crate::{Error, Result, io};

const CACHE_DIR_NAME: &str = "agent-sync";

/// Hash-keyed immutable blob store.
#[derive(Debug, Clone)]
pub struct ContentCache {
    dir: PathBuf,
}

impl ContentCache {
    /// Open a cache rooted at `dir`, creating its object directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let objects = dir.join("objects");
        fs::create_dir_all(&objects).map_err(|e| Error::io(&objects, e))?;
        Ok(Self { dir })
    }

    /// Default cache location: `$XDG_CACHE_HOME/agent-sync`, else
    /// `~/.cache/agent-sync`, else a temp-dir fallback.
    pub fn default_dir() -> PathBuf {
        if let Ok(xdg) = std::env::var("XDG_CACHE_HOME")
            && !xdg.trim().is_empty()
        {
            return PathBuf::from(xdg).join(CACHE_DIR_NAME);
        }
        match directories::BaseDirs::new() {
            Some(base) => base.home_dir().join(".cache").join(CACHE_DIR_NAME),
            None => std::env::temp_dir().join("agent-sync-cache"),
        }
    }

    /// Retrieve a blob by its digest.
    ///
    /// Returns `None` when the entry is absent. An entry whose content no
    /// longer hashes to its key is removed and reported as absent.
    pub fn get(&self, hash: &str) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(hash);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(&path, e)),
        };

        if sha256_hex(&data) != hash {
            tracing::warn!(key = %hash, "removing corrupt cache entry");
            let _ = fs::remove_file(&path);
            return Ok(None);
        }

        Ok(Some(data))
    }

    /// Store a blob under its digest.
    ///
    /// Refuses content that does not hash to the declared key. Storing an
    /// already-present key is a no-op.
    pub fn put(&self, hash: &str, content: &[u8]) -> Result<()> {
        let actual = sha256_hex(content);
        if actual != hash {
            return Err(Error::KeyMismatch {
                key: hash.to_string(),
                actual,
            });
        }

        let path = self.object_path(hash);
        if path.exists() {
            return Ok(());
        }
        io::write_atomic(&path, content)
    }

    /// Existence check without reading content.
    pub fn has(&self, hash: &str) -> bool {
        self.object_path(hash).exists()
    }

    /// Total bytes across all entries.
    pub fn size(&self) -> Result<u64> {
        let mut total = 0;
        for entry in walkdir::WalkDir::new(&self.dir) {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.dir.clone());
                Error::io(
                    path,
                    e.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
                )
            })?;
            if entry.file_type().is_file() {
                total += entry
                    .metadata()
                    .map_err(|e| {
                        Error::io(
                            entry.path(),
                            e.into_io_error()
                                .unwrap_or_else(|| std::io::Error::other("metadata")),
                        )
                    })?
                    .len();
            }
        }
        Ok(total)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn object_path(&self, hash: &str) -> PathBuf {
        if hash.len() < 2 {
            return self.dir.join("objects").join(hash);
        }
        self.dir.join("objects").join(&hash[..2]).join(hash)
    }
}

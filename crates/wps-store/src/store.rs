//! # Artifact Store
//!
//! Filesystem persistence for derived artifacts, rooted at the cache root.
//!
//! ## Invariants
//!
//! - A directory at an artifact path counts as "no artifact", never as an
//!   error.
//! - Writes are published with an atomic rename from a temporary sibling, so
//!   a concurrent reader sees either the previous file or the complete new
//!   one, never a partial artifact.
//! - Writes and deletes are confined to the cache root. Existence checks and
//!   reads may look anywhere (the source tree is read through the same store).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::StoreError;

/// Prefix of in-progress temporary files inside the cache tree.
pub const TEMP_PREFIX: &str = ".wps-";

/// Filesystem-backed artifact store.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    cache_root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `cache_root`.
    ///
    /// The directory does not need to exist yet; it is created on the first
    /// [`ensure_directory`](ArtifactStore::ensure_directory) call.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Whether a regular file (or symlink to one) exists at `path`.
    pub fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).map(|m| !m.is_dir()).unwrap_or(false)
    }

    /// Modification time of the file at `path`, if it exists and the
    /// platform reports one.
    pub fn modified(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path)
            .ok()
            .filter(|m| !m.is_dir())
            .and_then(|m| m.modified().ok())
    }

    /// Create `dir` and all missing parents. Idempotent.
    pub fn ensure_directory(&self, dir: &Path) -> Result<(), StoreError> {
        self.check_inside(dir)?;
        fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
    }

    /// Create or replace the file at `path` with `bytes`.
    ///
    /// The parent directory must already exist (see
    /// [`ensure_directory`](ArtifactStore::ensure_directory)). On failure the
    /// temporary file is removed and any previous artifact is left untouched.
    pub fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        self.check_inside(path)?;
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::NoParent(path.to_path_buf()))?;
        let write_err = |source: std::io::Error| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Read the whole file at `path`.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        fs::read(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Remove the file at `path`. Returns `true` if a file was removed and
    /// `false` if there was nothing to remove.
    pub fn delete(&self, path: &Path) -> Result<bool, StoreError> {
        self.check_inside(path)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Delete {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn check_inside(&self, path: &Path) -> Result<(), StoreError> {
        if path.starts_with(&self.cache_root) {
            Ok(())
        } else {
            Err(StoreError::OutsideCacheRoot(path.to_path_buf()))
        }
    }
}

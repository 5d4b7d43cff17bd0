//! # Store Errors
//!
//! Each variant carries the path it failed on so the log line alone is
//! enough to diagnose permission and disk-space problems.

use std::path::PathBuf;

use thiserror::Error;

/// Filesystem failure in the artifact store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Creating the artifact directory failed.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or publishing the artifact failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a file failed.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Deleting the artifact failed for a reason other than it being gone.
    #[error("failed to delete {}: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mutation targeted a path outside the cache root.
    #[error("refusing to modify path outside the cache root: {}", .0.display())]
    OutsideCacheRoot(PathBuf),

    /// The write target has no parent directory.
    #[error("artifact path has no parent directory: {}", .0.display())]
    NoParent(PathBuf),

    /// The source root is missing or not a directory, so every artifact
    /// would look orphaned.
    #[error("source root is not a directory: {}", .0.display())]
    SourceRootUnavailable(PathBuf),
}

impl StoreError {
    /// Whether the failure was the file not existing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}

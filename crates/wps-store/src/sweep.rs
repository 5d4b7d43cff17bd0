//! # Orphan Sweep
//!
//! Applies the evict-stale rule to the whole cache tree at once. Every
//! `*.webp` file under the cache root is mapped back to the request path that
//! produced it; when the source for that path is gone the artifact is
//! deleted, exactly as a request for it would have done.
//!
//! Files without the artifact suffix and in-progress temporary files are
//! left alone. Symlinked directories are not followed.
//!
//! A source root that is missing or not a directory (typo, unmounted
//! volume) aborts the sweep before anything is deleted.

use std::fs;
use std::path::{Path, PathBuf};

use wps_core::{decide, CacheAction, ExistenceFacts, PathResolver, ARTIFACT_SUFFIX};

use crate::error::StoreError;
use crate::store::{ArtifactStore, TEMP_PREFIX};

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Artifacts examined.
    pub scanned: usize,
    /// Artifacts whose source is gone (deleted unless this was a dry run).
    pub orphans: Vec<PathBuf>,
    /// Orphans that could not be deleted.
    pub failed: usize,
}

/// Walk the cache tree and evict every artifact whose source no longer
/// exists. With `dry_run` the orphans are reported but not deleted.
pub fn sweep_orphans(
    store: &ArtifactStore,
    resolver: &PathResolver,
    dry_run: bool,
) -> Result<SweepReport, StoreError> {
    let source_root = resolver.source_root();
    if !source_root.is_dir() {
        return Err(StoreError::SourceRootUnavailable(source_root.to_path_buf()));
    }

    let mut report = SweepReport::default();
    let root = store.cache_root();
    if !root.is_dir() {
        return Ok(report);
    }

    let suffix = format!(".{ARTIFACT_SUFFIX}");
    for artifact in walk_files(root)? {
        let Some(request_path) = request_path_for(root, &artifact, &suffix) else {
            continue;
        };
        report.scanned += 1;

        let paths = resolver.resolve(&request_path);
        if paths.artifact_path != artifact {
            continue;
        }
        let facts = ExistenceFacts::new(store.exists(&paths.source_path), true);
        if decide(facts) != CacheAction::EvictThenNotFound {
            continue;
        }

        if !dry_run {
            if let Err(e) = store.delete(&artifact) {
                tracing::warn!(error = %e, "failed to evict orphaned artifact");
                report.failed += 1;
                continue;
            }
            tracing::info!(artifact = %artifact.display(), "evicted orphaned artifact");
        }
        report.orphans.push(artifact);
    }

    Ok(report)
}

/// Map `<root>/a/b/cat.jpg.webp` back to `/a/b/cat.jpg`.
fn request_path_for(root: &Path, artifact: &Path, suffix: &str) -> Option<String> {
    let name = artifact.file_name()?.to_str()?;
    if name.starts_with(TEMP_PREFIX) || !name.ends_with(suffix) {
        return None;
    }
    let rel = artifact.strip_prefix(root).ok()?.to_str()?;
    let rel = rel.strip_suffix(suffix)?;
    Some(format!("/{}", rel.replace('\\', "/")))
}

/// Recursively collect regular files under `dir`, sorted.
fn walk_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current).map_err(|source| StoreError::Read {
            path: current.clone(),
            source,
        })?;
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}

//! # Image Request Orchestration
//!
//! Runs one image request end to end:
//!
//! ```text
//! resolve paths → gate extension → observe disk → decide → execute
//! ```
//!
//! | Action              | Side effects                               | Result        |
//! |---------------------|--------------------------------------------|---------------|
//! | `EvictThenNotFound` | delete artifact (best effort)              | 404           |
//! | `NotFound`          | none                                       | 404           |
//! | `ServeCached`       | read artifact                              | 200, `HIT`    |
//! | `GenerateThenServe` | read source, transcode, mkdir, write       | 200, `MISS`   |
//!
//! Generation holds the per-path flight lock and re-observes the disk after
//! acquiring it, so requests that queued behind a running generation serve
//! the artifact it wrote instead of transcoding again. Every filesystem call
//! and the transcode itself run on the blocking pool.
//!
//! A failed generation never falls back to serving whatever happens to be on
//! disk: the caller gets a 4xx/5xx and no artifact is published.

use std::sync::Arc;
use std::time::Instant;

use wps_codec::Transcoder;
use wps_core::{decide, AllowList, CacheAction, ExistenceFacts, PathResolver, ResolvedPaths, ServerConfig};
use wps_store::{ArtifactStore, GenerationLocks, StoreError};

use crate::error::ImageError;
use crate::middleware::metrics::ApiMetrics;

/// Whether a served artifact came from disk or was generated for this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// A successfully served artifact.
#[derive(Debug)]
pub struct ServedImage {
    pub bytes: Vec<u8>,
    pub status: CacheStatus,
}

/// The request handler core. Cheaply cloneable.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: PathResolver,
    allowed: AllowList,
    quality: f32,
    revalidate_mtime: bool,
    store: ArtifactStore,
    locks: GenerationLocks,
    transcoder: Arc<dyn Transcoder>,
    metrics: ApiMetrics,
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("resolver", &self.inner.resolver)
            .field("allowed", &self.inner.allowed)
            .field("quality", &self.inner.quality)
            .field("revalidate_mtime", &self.inner.revalidate_mtime)
            .field("in_flight", &self.inner.locks.in_flight())
            .finish()
    }
}

impl ImageCache {
    /// Build the handler from the server configuration.
    pub fn new(config: &ServerConfig, transcoder: Arc<dyn Transcoder>, metrics: ApiMetrics) -> Self {
        Self {
            inner: Arc::new(Inner {
                resolver: config.resolver(),
                allowed: config.allowed_types.clone(),
                quality: config.quality,
                revalidate_mtime: config.revalidate_mtime,
                store: ArtifactStore::new(&config.cache_root),
                locks: GenerationLocks::new(),
                transcoder,
                metrics,
            }),
        }
    }

    /// Number of artifact generations currently held or awaited.
    pub fn generations_in_flight(&self) -> usize {
        self.inner.locks.in_flight()
    }

    /// Serve the artifact for `request_path`, generating it if needed.
    pub async fn fetch(&self, request_path: &str) -> Result<ServedImage, ImageError> {
        let result = self.fetch_inner(request_path).await;
        match &result {
            Ok(served) if served.status == CacheStatus::Hit => self.inner.metrics.record_outcome("hit"),
            Ok(_) => self.inner.metrics.record_outcome("miss"),
            Err(e) => self.inner.metrics.record_outcome(e.outcome()),
        }
        result
    }

    async fn fetch_inner(&self, request_path: &str) -> Result<ServedImage, ImageError> {
        let paths = self.inner.resolver.resolve(request_path);

        if !self.inner.allowed.is_allowed(&paths.extension) {
            tracing::debug!(
                path = %paths.request_path,
                extension = %paths.extension,
                "extension not allowed"
            );
            return Err(ImageError::ExtensionNotAllowed);
        }

        let facts = self.observe(&paths).await?;
        let action = decide(facts);
        tracing::debug!(path = %paths.request_path, %action, "cache decision");

        match action {
            CacheAction::EvictThenNotFound => {
                self.evict(&paths).await;
                Err(ImageError::NotFound)
            }
            CacheAction::NotFound => Err(ImageError::NotFound),
            CacheAction::ServeCached => self.serve_cached(&paths).await,
            CacheAction::GenerateThenServe => self.generate(&paths).await,
        }
    }

    /// Read the existence facts for one request from disk.
    async fn observe(&self, paths: &ResolvedPaths) -> Result<ExistenceFacts, ImageError> {
        let store = self.inner.store.clone();
        let source = paths.source_path.clone();
        let artifact = paths.artifact_path.clone();
        let revalidate_mtime = self.inner.revalidate_mtime;
        run_blocking(move || {
            let facts = ExistenceFacts::new(store.exists(&source), store.exists(&artifact));
            if revalidate_mtime {
                facts.with_mtimes(store.modified(&source), store.modified(&artifact))
            } else {
                facts
            }
        })
        .await
    }

    /// Best-effort removal of an orphaned artifact. Failures are logged only.
    async fn evict(&self, paths: &ResolvedPaths) {
        let store = self.inner.store.clone();
        let artifact = paths.artifact_path.clone();
        match run_blocking(move || store.delete(&artifact)).await {
            Ok(Ok(true)) => {
                self.inner.metrics.record_outcome("evicted");
                tracing::info!(path = %paths.request_path, "evicted artifact of deleted source");
            }
            Ok(Ok(false)) => {}
            Ok(Err(e)) => tracing::warn!(path = %paths.request_path, error = %e, "failed to evict artifact"),
            Err(e) => tracing::warn!(path = %paths.request_path, error = %e, "failed to evict artifact"),
        }
    }

    async fn serve_cached(&self, paths: &ResolvedPaths) -> Result<ServedImage, ImageError> {
        let store = self.inner.store.clone();
        let artifact = paths.artifact_path.clone();
        match run_blocking(move || store.read(&artifact)).await? {
            Ok(bytes) => Ok(ServedImage {
                bytes,
                status: CacheStatus::Hit,
            }),
            // Evicted by a concurrent request between observe and read.
            Err(e) if e.is_not_found() => Err(ImageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn generate(&self, paths: &ResolvedPaths) -> Result<ServedImage, ImageError> {
        let _flight = self.inner.locks.acquire(&paths.artifact_path).await;

        // Re-check under the lock: an earlier holder may have just written it,
        // or the source may have gone away while we waited.
        match decide(self.observe(paths).await?) {
            CacheAction::GenerateThenServe => {}
            CacheAction::ServeCached => return self.serve_cached(paths).await,
            CacheAction::EvictThenNotFound => {
                self.evict(paths).await;
                return Err(ImageError::NotFound);
            }
            CacheAction::NotFound => return Err(ImageError::NotFound),
        }

        let started = Instant::now();
        let store = self.inner.store.clone();
        let transcoder = Arc::clone(&self.inner.transcoder);
        let quality = self.inner.quality;
        let job = paths.clone();

        let result = run_blocking(move || -> Result<Vec<u8>, ImageError> {
            let source = store.read(&job.source_path).map_err(|e| match e {
                e if e.is_not_found() => ImageError::NotFound,
                e => ImageError::Store(e),
            })?;
            let bytes = transcoder.transcode(&source, &job.extension, quality)?;
            store.ensure_directory(&job.artifact_dir)?;
            store.write(&job.artifact_path, &bytes)?;
            Ok(bytes)
        })
        .await
        .and_then(|r| r);

        match result {
            Ok(bytes) => {
                let elapsed = started.elapsed();
                self.inner.metrics.observe_transcode(elapsed.as_secs_f64());
                tracing::info!(
                    path = %paths.request_path,
                    artifact = %paths.artifact_path.display(),
                    bytes = bytes.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    quality,
                    "generated artifact"
                );
                Ok(ServedImage {
                    bytes,
                    status: CacheStatus::Miss,
                })
            }
            Err(e) => {
                self.inner.metrics.record_transcode_failure(failure_kind(&e));
                Err(e)
            }
        }
    }
}

fn failure_kind(err: &ImageError) -> &'static str {
    match err {
        ImageError::UnsupportedFormat(_) => "unsupported_format",
        ImageError::Codec(e) => e.kind(),
        ImageError::Store(StoreError::Read { .. }) => "read",
        ImageError::Store(_) => "write",
        ImageError::NotFound => "source_missing",
        ImageError::ExtensionNotAllowed | ImageError::Internal(_) => "internal",
    }
}

/// Run blocking filesystem or codec work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, ImageError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ImageError::Internal(format!("blocking task failed: {e}")))
}

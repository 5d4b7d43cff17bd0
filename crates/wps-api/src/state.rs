//! # Application State
//!
//! Shared state handed to every handler. Built once at startup from an
//! immutable [`ServerConfig`]; cloning is cheap (`Arc` internals).

use std::sync::Arc;

use wps_codec::{Transcoder, WebpTranscoder};
use wps_core::ServerConfig;

use crate::middleware::metrics::ApiMetrics;
use crate::orchestration::ImageCache;

/// Shared application state accessible to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub images: ImageCache,
    pub metrics: ApiMetrics,
}

impl AppState {
    /// State backed by the default WebP transcoder.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_transcoder(config, Arc::new(WebpTranscoder::new()))
    }

    /// State backed by a caller-supplied transcoder.
    pub fn with_transcoder(config: ServerConfig, transcoder: Arc<dyn Transcoder>) -> Self {
        let metrics = ApiMetrics::new();
        let images = ImageCache::new(&config, transcoder, metrics.clone());
        Self {
            config: Arc::new(config),
            images,
            metrics,
        }
    }
}

//! # wps-cli — Command-Line Interface for the WebP Server
//!
//! Provides the `wps` binary.
//!
//! ## Subcommands
//!
//! - `wps serve` — start the HTTP server.
//! - `wps check-config` — load and validate the configuration, print the
//!   resolved values.
//! - `wps resolve <path>` — show where a request path maps on disk and what
//!   the cache would do with it.
//! - `wps prune` — evict every artifact whose source image is gone.
//!
//! ```bash
//! wps --config config.json serve --port 8080
//! wps -v prune --dry-run
//! WPS_QUALITY=90 wps check-config
//! ```

pub mod check;
pub mod prune;
pub mod resolve;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};
use wps_core::ServerConfig;

/// Load the configuration file and apply `WPS_*` environment overrides.
pub fn load_config(path: &Path) -> Result<ServerConfig> {
    ServerConfig::load(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

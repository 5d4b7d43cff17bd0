//! # Serve
//!
//! `wps serve` loads the configuration, applies command-line overrides and
//! runs the HTTP server until Ctrl-C or SIGTERM.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use wps_core::ServerConfig;

/// Arguments for `wps serve`.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Bind address, overriding HOST from the configuration.
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port, overriding PORT from the configuration.
    #[arg(long)]
    pub port: Option<u16>,
}

/// Command-line overrides win over the file and the environment.
pub fn apply_overrides(mut config: ServerConfig, args: &ServeArgs) -> ServerConfig {
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config
}

/// Execute `wps serve`.
pub fn run_serve(args: &ServeArgs, config_path: &Path) -> Result<u8> {
    let config = apply_overrides(crate::load_config(config_path)?, args);

    if !config.image_root.is_dir() {
        tracing::warn!(
            image_root = %config.image_root.display(),
            "image root is not a directory; every request will 404 until it exists"
        );
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let addr = config.listen_address();
    runtime
        .block_on(wps_api::serve(config, wps_api::shutdown_signal()))
        .with_context(|| format!("server on {addr} failed"))?;

    tracing::info!("server stopped");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig::from_json(
            r#"{"HOST": "127.0.0.1", "PORT": "3333", "IMG_PATH": "/pics", "QUALITY": "80", "ALLOWED_TYPES": ["jpg"]}"#,
            Path::new("/srv"),
        )
        .unwrap()
    }

    #[test]
    fn no_overrides_keeps_file_values() {
        let c = apply_overrides(config(), &ServeArgs::default());
        assert_eq!(c.listen_address(), "127.0.0.1:3333");
    }

    #[test]
    fn overrides_replace_host_and_port() {
        let args = ServeArgs {
            host: Some("0.0.0.0".into()),
            port: Some(8080),
        };
        let c = apply_overrides(config(), &args);
        assert_eq!(c.listen_address(), "0.0.0.0:8080");
    }
}

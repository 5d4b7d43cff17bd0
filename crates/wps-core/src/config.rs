//! # Server Configuration
//!
//! Loaded once at startup from a JSON file, then overridden field by field
//! from `WPS_*` environment variables. The result is an immutable
//! [`ServerConfig`] shared by reference for the lifetime of the process.
//!
//! ```json
//! {
//!   "HOST": "127.0.0.1",
//!   "PORT": "3333",
//!   "IMG_PATH": "/var/www/pics",
//!   "QUALITY": "80",
//!   "ALLOWED_TYPES": ["jpg", "png"]
//! }
//! ```
//!
//! `PORT` and `QUALITY` accept either a string or a number. `QUALITY` must
//! parse as a float but is not range-checked; the codec receives it as-is.
//! `EXHAUST_PATH` (cache root, default `<cwd>/exhaust`) and
//! `REVALIDATE_MTIME` (default `false`) are optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::gate::AllowList;
use crate::paths::PathResolver;

/// Default bind address when `HOST` is absent.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port when `PORT` is absent.
pub const DEFAULT_PORT: u16 = 3333;

/// Directory name of the cache root under the working directory.
pub const DEFAULT_EXHAUST_DIR: &str = "exhaust";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "WPS_";

/// Fully resolved, immutable server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Absolute root directory of the original images.
    pub image_root: PathBuf,
    /// Transcoding quality, passed through to the codec unvalidated.
    pub quality: f32,
    /// Permitted request extensions.
    pub allowed_types: AllowList,
    /// Absolute root directory of the derived artifacts.
    pub cache_root: PathBuf,
    /// Regenerate artifacts older than their source.
    pub revalidate_mtime: bool,
}

/// A field that may be written as a JSON string or a JSON scalar.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// On-disk shape of the configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "HOST", default)]
    host: Option<String>,
    #[serde(rename = "PORT", default)]
    port: Option<Scalar>,
    #[serde(rename = "IMG_PATH")]
    img_path: String,
    #[serde(rename = "QUALITY")]
    quality: Scalar,
    #[serde(rename = "ALLOWED_TYPES")]
    allowed_types: AllowList,
    #[serde(rename = "EXHAUST_PATH", default)]
    exhaust_path: Option<String>,
    #[serde(rename = "REVALIDATE_MTIME", default)]
    revalidate_mtime: Option<Scalar>,
}

impl ServerConfig {
    /// Load the configuration file at `path`, resolve relative paths against
    /// the process working directory, then apply `WPS_*` overrides from the
    /// environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cwd = std::env::current_dir().map_err(ConfigError::WorkingDirectory)?;
        Self::from_json(&json, &cwd)?.with_env_overrides(&cwd, |key| std::env::var(key).ok())
    }

    /// Parse a configuration document. Relative `IMG_PATH` / `EXHAUST_PATH`
    /// values are joined onto `working_dir`.
    pub fn from_json(json: &str, working_dir: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;

        let host = match raw.host {
            Some(h) if h.trim().is_empty() => "0.0.0.0".to_string(),
            Some(h) => h.trim().to_string(),
            None => DEFAULT_HOST.to_string(),
        };
        let port = match raw.port {
            Some(p) => parse_port(&p.into_text())?,
            None => DEFAULT_PORT,
        };
        let image_root = parse_dir("IMG_PATH", &raw.img_path, working_dir)?;
        let quality = parse_quality(&raw.quality.into_text())?;
        let cache_root = match raw.exhaust_path {
            Some(p) => parse_dir("EXHAUST_PATH", &p, working_dir)?,
            None => working_dir.join(DEFAULT_EXHAUST_DIR),
        };
        let revalidate_mtime = match raw.revalidate_mtime {
            Some(v) => parse_flag("REVALIDATE_MTIME", &v.into_text())?,
            None => false,
        };

        Ok(Self {
            host,
            port,
            image_root,
            quality,
            allowed_types: raw.allowed_types,
            cache_root,
            revalidate_mtime,
        })
    }

    /// Apply `WPS_HOST`, `WPS_PORT`, `WPS_IMG_PATH`, `WPS_QUALITY`,
    /// `WPS_ALLOWED_TYPES`, `WPS_EXHAUST_PATH` and `WPS_REVALIDATE_MTIME`.
    ///
    /// `lookup` returns the value of an environment variable, if set.
    pub fn with_env_overrides(
        mut self,
        working_dir: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(host) = var("HOST") {
            self.host = host.trim().to_string();
        }
        if let Some(port) = var("PORT") {
            self.port = parse_port(&port)?;
        }
        if let Some(dir) = var("IMG_PATH") {
            self.image_root = parse_dir("IMG_PATH", &dir, working_dir)?;
        }
        if let Some(q) = var("QUALITY") {
            self.quality = parse_quality(&q)?;
        }
        if let Some(types) = var("ALLOWED_TYPES") {
            self.allowed_types = AllowList::from_csv(&types);
        }
        if let Some(dir) = var("EXHAUST_PATH") {
            self.cache_root = parse_dir("EXHAUST_PATH", &dir, working_dir)?;
        }
        if let Some(flag) = var("REVALIDATE_MTIME") {
            self.revalidate_mtime = parse_flag("REVALIDATE_MTIME", &flag)?;
        }
        Ok(self)
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn listen_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Path resolver bound to this configuration's roots.
    pub fn resolver(&self) -> PathResolver {
        PathResolver::new(&self.image_root, &self.cache_root)
    }
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|e| ConfigError::invalid("PORT", format!("{value:?}: {e}")))
}

fn parse_quality(value: &str) -> Result<f32, ConfigError> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|e| ConfigError::invalid("QUALITY", format!("{value:?}: {e}")))
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::invalid(field, format!("not a boolean: {other:?}"))),
    }
}

fn parse_dir(field: &'static str, value: &str, working_dir: &Path) -> Result<PathBuf, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty"));
    }
    let path = PathBuf::from(value);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(working_dir.join(path))
    }
}

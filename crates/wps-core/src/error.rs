//! # Error Types
//!
//! Configuration errors surface at startup only. Request-time failures are
//! modelled by the crates that perform the I/O (`wps-store`, `wps-codec`)
//! and mapped to HTTP responses in `wps-api`.

use std::path::PathBuf;

use thiserror::Error;

/// Error while loading or validating the server configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON or has the wrong shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field is present but its value cannot be used.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Configuration key, as written in the file (e.g. `QUALITY`).
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The process working directory could not be determined.
    #[error("cannot determine working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

//! # Image Errors
//!
//! Request-scoped failures of the image route and their HTTP mapping.
//!
//! | Error                 | Status | Body                              |
//! |-----------------------|--------|-----------------------------------|
//! | `ExtensionNotAllowed` | 403    | `File extension not allowed!`     |
//! | `NotFound`            | 404    | `File not found!`                 |
//! | `UnsupportedFormat`   | 415    | JSON error body                   |
//! | `Codec`, `Store`, `Internal` | 500 | JSON error body, details hidden |
//!
//! 403 and 404 keep their plain-text bodies for compatibility with existing
//! clients. Everything else uses the structured JSON body. Server-side
//! failures are logged here, once, when they become a response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wps_codec::CodecError;
use wps_store::StoreError;

/// Body text of a 403 response.
pub const FORBIDDEN_BODY: &str = "File extension not allowed!";

/// Body text of a 404 response.
pub const NOT_FOUND_BODY: &str = "File not found!";

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "UNSUPPORTED_FORMAT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Failure of one image request.
#[derive(Error, Debug)]
pub enum ImageError {
    /// The request's extension is not in the allow-list (403).
    #[error("file extension not allowed")]
    ExtensionNotAllowed,

    /// The source image does not exist (404).
    #[error("file not found")]
    NotFound,

    /// The source cannot be decoded by any known codec (415).
    #[error("unsupported source format: {0:?}")]
    UnsupportedFormat(String),

    /// Decoding or encoding failed (500).
    #[error("transcode failed: {0}")]
    Codec(#[source] CodecError),

    /// Filesystem failure while reading or persisting (500).
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    /// Any other server-side failure (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CodecError> for ImageError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::UnsupportedFormat { extension } => Self::UnsupportedFormat(extension),
            other => Self::Codec(other),
        }
    }
}

impl ImageError {
    /// HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::ExtensionNotAllowed => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::UnsupportedFormat(_) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT"),
            Self::Codec(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TRANSCODE_FAILED"),
            Self::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Label used for the cache outcome metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::ExtensionNotAllowed => "forbidden",
            Self::NotFound => "not_found",
            Self::UnsupportedFormat(_) => "unsupported",
            Self::Codec(_) | Self::Store(_) | Self::Internal(_) => "error",
        }
    }
}

impl IntoResponse for ImageError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        match &self {
            Self::ExtensionNotAllowed => return (status, FORBIDDEN_BODY).into_response(),
            Self::NotFound => return (status, NOT_FOUND_BODY).into_response(),
            Self::UnsupportedFormat(_) => tracing::info!(error = %self, "unsupported source format"),
            Self::Codec(_) | Self::Store(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "image request failed")
            }
        }

        // Never expose filesystem paths or codec internals to clients.
        let message = match &self {
            Self::UnsupportedFormat(_) => self.to_string(),
            _ => "An internal error occurred".to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

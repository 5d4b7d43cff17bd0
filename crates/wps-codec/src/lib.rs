//! # wps-codec — Image Transcoding
//!
//! Turns original image bytes into WebP artifact bytes. The server core only
//! sees the [`Transcoder`] trait, so tests can substitute a counting or
//! failing implementation and the production path uses [`WebpTranscoder`].
//!
//! ## Format Selection
//!
//! The decoder is chosen from the request's extension hint (`jpg`/`jpeg` or
//! `png`, case-insensitive). Anything else fails with
//! [`CodecError::UnsupportedFormat`] before any bytes are decoded. The
//! encoder never receives an empty image.

pub mod error;
pub mod format;
pub mod webp;

pub use error::CodecError;
pub use format::SourceFormat;
pub use webp::WebpTranscoder;

/// Converts source image bytes into artifact bytes.
///
/// Implementations are CPU-bound and synchronous; async callers should run
/// them on a blocking thread.
pub trait Transcoder: Send + Sync + 'static {
    /// Transcode `source` whose format is hinted by `extension`.
    ///
    /// `quality` is forwarded to the encoder unvalidated.
    fn transcode(&self, source: &[u8], extension: &str, quality: f32) -> Result<Vec<u8>, CodecError>;
}

//! # Codec Errors

use thiserror::Error;

/// Failure while turning a source image into an artifact.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The extension hint does not name a decodable source format.
    #[error("unsupported source format: {extension:?}")]
    UnsupportedFormat {
        /// The extension that was offered as a hint.
        extension: String,
    },

    /// The source bytes could not be decoded as the hinted format.
    #[error("failed to decode {format} source: {source}")]
    Decode {
        /// Format the decoder was selected for.
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    /// The decoded image could not be encoded.
    #[error("failed to encode artifact: {0}")]
    Encode(#[source] image::ImageError),
}

impl CodecError {
    /// Short label for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::Decode { .. } => "decode",
            Self::Encode(_) => "encode",
        }
    }
}

//! # WebP Transcoder
//!
//! Decodes JPEG or PNG with the `image` crate and re-encodes as lossless
//! WebP. Every decoded image is normalized to 8-bit RGBA first, since the
//! WebP encoder only accepts 8-bit layouts and 16-bit PNGs are common.
//!
//! The encoder runs in lossless mode, so `quality` does not change the output
//! bytes. It is still accepted and logged so a lossy encoder can be swapped in
//! behind the same [`Transcoder`] contract.

use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::CodecError;
use crate::format::SourceFormat;
use crate::Transcoder;

/// Production transcoder: JPEG/PNG in, lossless WebP out.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpTranscoder;

impl WebpTranscoder {
    pub fn new() -> Self {
        Self
    }
}

impl Transcoder for WebpTranscoder {
    fn transcode(&self, source: &[u8], extension: &str, quality: f32) -> Result<Vec<u8>, CodecError> {
        let format = SourceFormat::from_extension(extension).ok_or_else(|| {
            CodecError::UnsupportedFormat {
                extension: extension.to_string(),
            }
        })?;

        let decoded = image::load_from_memory_with_format(source, format.image_format())
            .map_err(|source| CodecError::Decode {
                format: format.as_str(),
                source,
            })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut out = Vec::new();
        WebPEncoder::new_lossless(&mut out)
            .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(CodecError::Encode)?;

        tracing::debug!(
            %format,
            width,
            height,
            quality,
            input_bytes = source.len(),
            output_bytes = out.len(),
            "transcoded image to webp"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn sample_png() -> Vec<u8> {
        let img = RgbaImage::from_fn(4, 3, |x, y| Rgba([x as u8 * 60, y as u8 * 80, 10, 255]));
        encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
    }

    fn sample_jpeg() -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 8, Rgb([200, 100, 50]));
        encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
    }

    fn assert_webp(bytes: &[u8], width: u32, height: u32) {
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::WebP).unwrap();
        assert_eq!(decoded.width(), width);
        assert_eq!(decoded.height(), height);
    }

    #[test]
    fn png_becomes_webp() {
        let out = WebpTranscoder::new().transcode(&sample_png(), "png", 80.0).unwrap();
        assert_webp(&out, 4, 3);
    }

    #[test]
    fn jpeg_becomes_webp() {
        let out = WebpTranscoder::new().transcode(&sample_jpeg(), "jpg", 80.0).unwrap();
        assert_webp(&out, 8, 8);
    }

    #[test]
    fn lossless_png_pixels_survive() {
        let png = sample_png();
        let out = WebpTranscoder::new().transcode(&png, "png", 80.0).unwrap();
        let original = image::load_from_memory(&png).unwrap().to_rgba8();
        let roundtrip = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(original, roundtrip);
    }

    #[test]
    fn sixteen_bit_png_is_accepted() {
        let img = image::ImageBuffer::<image::Rgb<u16>, Vec<u16>>::from_pixel(2, 2, image::Rgb([1000, 20000, 65535]));
        let png = encode(DynamicImage::ImageRgb16(img), ImageFormat::Png);
        let out = WebpTranscoder::new().transcode(&png, "png", 80.0).unwrap();
        assert_webp(&out, 2, 2);
    }

    #[test]
    fn out_of_range_quality_is_passed_through() {
        let out = WebpTranscoder::new().transcode(&sample_png(), "png", 400.0).unwrap();
        assert_webp(&out, 4, 3);
    }

    #[test]
    fn unknown_extension_fails_before_decoding() {
        let err = WebpTranscoder::new().transcode(&sample_png(), "gif", 80.0).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedFormat { ref extension } if extension == "gif"));
    }

    #[test]
    fn corrupt_source_is_decode_error() {
        let err = WebpTranscoder::new()
            .transcode(b"definitely not a jpeg", "jpeg", 80.0)
            .unwrap_err();
        assert!(matches!(err, CodecError::Decode { format: "jpeg", .. }));
    }

    #[test]
    fn mismatched_hint_is_decode_error() {
        let err = WebpTranscoder::new().transcode(&sample_png(), "jpg", 80.0).unwrap_err();
        assert_eq!(err.kind(), "decode");
    }
}

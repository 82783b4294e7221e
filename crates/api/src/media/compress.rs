//! Image resize and recompression for the `compressed` media mode.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError};
use thiserror::Error;

use super::MediaError;

/// Target geometry and quality for recompressed images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    /// Output width in pixels. Narrower sources are left at their own width.
    pub target_width: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            target_width: 800,
            quality: 20,
        }
    }
}

/// Failure while recompressing a single image.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] ImageError),
}

impl CompressError {
    /// Attach the position of the offending upload.
    pub(crate) fn at(self, index: usize) -> MediaError {
        match self {
            Self::Decode(source) => MediaError::Decode { index, source },
            Self::Encode(source) => MediaError::Encode { index, source },
        }
    }
}

/// Decode `bytes` as an image, shrink it to the target width and re-encode it as JPEG.
///
/// Aspect ratio is always preserved. Images already at or below the target width
/// are re-encoded without resizing so they are never upscaled.
///
/// This is CPU-bound; async callers should run it on the blocking pool.
///
/// # Errors
///
/// Returns `CompressError::Decode` if the bytes are not a supported image, or
/// `CompressError::Encode` if JPEG encoding fails.
pub fn compress_image(bytes: &[u8], settings: CompressionSettings) -> Result<Vec<u8>, CompressError> {
    let img = image::load_from_memory(bytes).map_err(CompressError::Decode)?;

    let img = if img.width() > settings.target_width {
        let height = scaled_height(img.width(), img.height(), settings.target_width);
        img.resize_exact(settings.target_width, height, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, settings.quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(CompressError::Encode)?;

    Ok(out)
}

/// Height that keeps `width:height` when the width becomes `target_width`.
fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = (u64::from(height) * u64::from(target_width) + u64::from(width) / 2)
        / u64::from(width.max(1));
    u32::try_from(scaled.max(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200])
        });
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_scaled_height_keeps_ratio() {
        assert_eq!(scaled_height(1600, 1200, 800), 600);
        assert_eq!(scaled_height(1000, 333, 800), 266);
        assert_eq!(scaled_height(5000, 1, 800), 1);
    }

    #[test]
    fn test_wide_image_is_shrunk_to_target_width() {
        let out = compress_image(&png(1600, 900), CompressionSettings::default()).unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 800);
        assert_eq!(decoded.height(), 450);
    }

    #[test]
    fn test_narrow_image_is_not_upscaled() {
        let out = compress_image(&png(320, 240), CompressionSettings::default()).unwrap();

        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = compress_image(b"definitely not an image", CompressionSettings::default())
            .unwrap_err();
        assert!(matches!(err, CompressError::Decode(_)));
    }

    #[test]
    fn test_lower_quality_produces_smaller_output() {
        let source = png(900, 600);
        let low = compress_image(
            &source,
            CompressionSettings {
                target_width: 800,
                quality: 20,
            },
        )
        .unwrap();
        let high = compress_image(
            &source,
            CompressionSettings {
                target_width: 800,
                quality: 95,
            },
        )
        .unwrap();
        assert!(low.len() < high.len());
    }
}

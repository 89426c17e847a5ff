//! Image decoding with content-based format detection and dimension limits.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

/// Image decoder with configurable limits.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an in-memory image.
    ///
    /// The format is guessed from the content first and from the extension
    /// only as a fallback, so a PNG saved as `.jpg` still decodes.
    pub fn decode(&self, bytes: &[u8], path: &Path) -> PipelineResult<DecodedImage> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {e}"),
            })?;

        let format = match reader.format() {
            Some(f) => f,
            None => ImageFormat::from_path(path).map_err(|_| PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unsupported image format".to_string(),
            })?,
        };

        let image = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim: self.limits.max_image_dimension,
            });
        }

        tracing::trace!("Decoded {:?} as {:?} ({}x{})", path, format, width, height);
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 20, 30])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let decoded = decoder.decode(&png_bytes(8, 4), Path::new("a.png")).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.width, decoded.height), (8, 4));
    }

    #[test]
    fn test_format_detected_by_content() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let decoded = decoder
            .decode(&png_bytes(4, 4), Path::new("misnamed.jpg"))
            .unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
    }

    #[test]
    fn test_corrupt_bytes_are_decode_error() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let mut bytes = png_bytes(16, 16);
        bytes.truncate(40);
        let err = decoder.decode(&bytes, Path::new("broken.png")).err().unwrap();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_dimension_limit() {
        let decoder = ImageDecoder::new(LimitsConfig {
            max_image_dimension: 8,
            ..LimitsConfig::default()
        });
        let err = decoder
            .decode(&png_bytes(16, 4), Path::new("wide.png"))
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::ImageTooLarge { width: 16, .. }));
    }
}

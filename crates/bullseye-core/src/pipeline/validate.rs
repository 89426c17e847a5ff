//! Input checks before an image is handed to the embedding engine.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

/// Known image signatures as (offset, magic bytes).
const SIGNATURES: &[(usize, &[u8])] = &[
    (0, &[0xFF, 0xD8, 0xFF]),          // JPEG
    (0, &[0x89, b'P', b'N', b'G']),    // PNG
    (0, b"GIF8"),                      // GIF
    (0, b"BM"),                        // BMP
    (0, &[b'I', b'I', 0x2A, 0x00]),    // TIFF little-endian
    (0, &[b'M', b'M', 0x00, 0x2A]),    // TIFF big-endian
    (8, b"WEBP"),                      // WebP (RIFF....WEBP)
    (4, b"ftyp"),                      // HEIF / AVIF container
];

/// Validates files and reads them into memory for decoding.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check size limits, read the file, and verify its magic bytes.
    ///
    /// Returns the file contents so the caller reads each image once.
    pub fn read_checked(&self, path: &Path) -> PipelineResult<Vec<u8>> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::FileNotFound(path.to_path_buf()),
            _ => PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read metadata: {e}"),
            },
        })?;

        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read file: {e}"),
        })?;

        if !has_image_signature(&bytes) {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }

        Ok(bytes)
    }
}

/// Whether the header matches any known image format.
fn has_image_signature(bytes: &[u8]) -> bool {
    SIGNATURES.iter().any(|(offset, magic)| {
        bytes
            .get(*offset..offset + magic.len())
            .is_some_and(|window| window == *magic)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures() {
        assert!(has_image_signature(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]));
        assert!(has_image_signature(&[
            0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A
        ]));
        assert!(has_image_signature(b"RIFF\0\0\0\0WEBPVP8 "));
        assert!(has_image_signature(&[b'I', b'I', 0x2A, 0x00, 0, 0]));
        assert!(!has_image_signature(&[b'I', b'I', 0x00, 0x00, 0, 0]));
        assert!(!has_image_signature(b"dummy content"));
        assert!(!has_image_signature(&[0xFF]));
    }

    #[test]
    fn test_read_checked_rejects_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, "dummy content").unwrap();

        let err = Validator::new(LimitsConfig::default())
            .read_checked(&path)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_read_checked_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Validator::new(LimitsConfig::default())
            .read_checked(&dir.path().join("gone.png"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_huge_size_limit_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.gif");
        std::fs::write(&path, b"GIF89a rest").unwrap();

        let limits = LimitsConfig {
            max_file_size_mb: u64::MAX,
            ..LimitsConfig::default()
        };
        assert!(Validator::new(limits).read_checked(&path).is_ok());
    }

    #[test]
    fn test_oversized_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        let mut body = vec![0x89, b'P', b'N', b'G'];
        body.resize(1024 * 1024 + 1, 0);
        std::fs::write(&path, body).unwrap();

        let limits = LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        };
        let err = Validator::new(limits).read_checked(&path).unwrap_err();
        assert!(matches!(err, PipelineError::FileTooLarge { max_mb: 1, .. }));
    }

    #[test]
    fn test_read_checked_returns_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.gif");
        std::fs::write(&path, b"GIF89a rest").unwrap();

        let bytes = Validator::new(LimitsConfig::default())
            .read_checked(&path)
            .unwrap();
        assert_eq!(bytes, b"GIF89a rest");
    }
}

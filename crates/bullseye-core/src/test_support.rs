//! Deterministic embedder and image fixtures for tests.
//!
//! `ColorEmbedder` maps an image to its mean RGB color and each label to a
//! fixed color vector, so "which label is closest" is decided by pixel color.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::config::LimitsConfig;
use crate::embedding::Embedder;
use crate::error::{ModelError, PipelineResult};
use crate::math::l2_normalize;
use crate::pipeline::decode::ImageDecoder;

pub const RED: [u8; 3] = [230, 20, 20];
pub const GREEN: [u8; 3] = [20, 230, 20];
pub const BLUE: [u8; 3] = [20, 20, 230];

pub struct ColorEmbedder {
    decoder: ImageDecoder,
    labels: HashMap<String, Vec<f32>>,
    text_calls: AtomicUsize,
}

impl ColorEmbedder {
    pub fn new(labels: &[(&str, [f32; 3])]) -> Self {
        Self {
            decoder: ImageDecoder::new(LimitsConfig::default()),
            labels: labels
                .iter()
                .map(|(name, v)| (name.to_string(), l2_normalize(v)))
                .collect(),
            text_calls: AtomicUsize::new(0),
        }
    }

    /// "anime" is red, "superheroes" is green, "other" is blue.
    pub fn standard() -> Self {
        Self::new(&[
            ("anime", [1.0, 0.0, 0.0]),
            ("superheroes", [0.0, 1.0, 0.0]),
            ("other", [0.0, 0.0, 1.0]),
        ])
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }
}

impl Embedder for ColorEmbedder {
    fn embed_image(&self, image_bytes: &[u8], path: &Path) -> PipelineResult<Vec<f32>> {
        let decoded = self.decoder.decode(image_bytes, path)?;
        let rgb = decoded.image.to_rgb8();
        let mut sum = [0f32; 3];
        for pixel in rgb.pixels() {
            for (c, total) in sum.iter_mut().enumerate() {
                *total += pixel[c] as f32;
            }
        }
        Ok(l2_normalize(&sum))
    }

    fn embed_text(&self, label: &str) -> Result<Vec<f32>, ModelError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        self.labels
            .get(label)
            .cloned()
            .ok_or_else(|| ModelError::Inference {
                message: format!("no vector for {label}"),
            })
    }
}

/// Encode a small solid-color PNG.
pub fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb(color)));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("PNG encode into memory");
    buf.into_inner()
}

/// Write a solid-color PNG to `dir/name`.
pub fn write_png(dir: &Path, name: &str, color: [u8; 3]) {
    std::fs::write(dir.join(name), png_bytes(color)).expect("write fixture");
}

/// Write `{"labels": [...]}` to `dir/labels.json` and return its path.
pub fn write_labels(dir: &Path, labels: &[&str]) -> std::path::PathBuf {
    let path = dir.join("labels.json");
    let body = serde_json::json!({ "labels": labels });
    std::fs::write(&path, body.to_string()).expect("write labels");
    path
}

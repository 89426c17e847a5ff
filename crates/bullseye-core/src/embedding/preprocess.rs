//! Image preprocessing for the CLIP visual encoder.
//!
//! CLIP ViT-B/32 expects:
//! - Shortest side resized to the input size with bicubic filtering
//! - Center crop to `size × size`
//! - Pixels scaled to [0, 1] then normalized with CLIP's per-channel mean/std
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::imageops::{self, FilterType};
use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// CLIP normalization mean (per-channel RGB).
pub const CLIP_MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];

/// CLIP normalization std (per-channel RGB).
#[allow(clippy::excessive_precision)]
pub const CLIP_STD: [f32; 3] = [0.26862954, 0.26130258, 0.27577711];

/// Preprocess an image for CLIP inference.
pub fn preprocess(image: &DynamicImage, image_size: u32) -> Array4<f32> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    // Shortest side becomes `image_size`, aspect ratio preserved.
    let (new_w, new_h) = if width <= height {
        let h = (height as f64 * image_size as f64 / width.max(1) as f64).round() as u32;
        (image_size, h.max(image_size))
    } else {
        let w = (width as f64 * image_size as f64 / height.max(1) as f64).round() as u32;
        (w.max(image_size), image_size)
    };
    let resized = imageops::resize(&rgb, new_w, new_h, FilterType::CatmullRom);

    let left = (new_w - image_size) / 2;
    let top = (new_h - image_size) / 2;
    let cropped = imageops::crop_imm(&resized, left, top, image_size, image_size).to_image();

    let size = image_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, size, size));
    for (x, y, pixel) in cropped.enumerate_pixels() {
        for c in 0..CHANNELS {
            let value = pixel[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (value - CLIP_MEAN[c]) / CLIP_STD[c];
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_preprocess_shape_landscape() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let tensor = preprocess(&img, 224);
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_preprocess_shape_portrait_and_tiny() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(30, 500));
        assert_eq!(preprocess(&img, 224).shape(), &[1, 3, 224, 224]);

        let img = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        assert_eq!(preprocess(&img, 224).shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_preprocess_normalization() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])));
        let tensor = preprocess(&img, 32);
        for c in 0..CHANNELS {
            let expected = (1.0 - CLIP_MEAN[c]) / CLIP_STD[c];
            assert!((tensor[[0, c, 16, 16]] - expected).abs() < 1e-3);
        }

        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])));
        let tensor = preprocess(&img, 32);
        for c in 0..CHANNELS {
            let expected = -CLIP_MEAN[c] / CLIP_STD[c];
            assert!((tensor[[0, c, 16, 16]] - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_center_crop_keeps_middle() {
        // Blue | red | blue, each third 100px wide. Cropping a 100px-tall
        // landscape image to a square keeps only the red middle.
        let img = RgbImage::from_fn(300, 100, |x, _| {
            if (100..200).contains(&x) {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let tensor = preprocess(&DynamicImage::ImageRgb8(img), 64);
        let red = (1.0 - CLIP_MEAN[0]) / CLIP_STD[0];
        let blue_in_red_channel = -CLIP_MEAN[0] / CLIP_STD[0];
        let center = tensor[[0, 0, 32, 32]];
        assert!((center - red).abs() < 0.05);
        assert!((center - blue_in_red_channel).abs() > 1.0);
    }
}

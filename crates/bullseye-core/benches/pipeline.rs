//! Benchmarks for the Bullseye sorting pipeline.
//!
//! Run with: cargo bench -p bullseye-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;

use bullseye_core::config::LimitsConfig;
use bullseye_core::embedding::preprocess::preprocess;
use bullseye_core::math::l2_normalize;
use bullseye_core::pipeline::ImageDecoder;
use bullseye_core::{Classifier, LabelConfig, LabelIndex};

/// CLIP ViT-B/32 embedding width.
const DIM: usize = 512;

fn pseudo_vector(seed: usize) -> Vec<f32> {
    let raw: Vec<f32> = (0..DIM)
        .map(|i| (((seed * 31 + i * 17) % 97) as f32 - 48.0) / 48.0)
        .collect();
    l2_normalize(&raw)
}

fn label_index(n: usize) -> LabelIndex {
    let labels = LabelConfig::from_labels((0..n).map(|i| format!("label{i}")))
        .expect("generated labels are valid");
    let vectors = (0..n).map(pseudo_vector).collect();
    LabelIndex::from_vectors(&labels, vectors).expect("consistent dimensions")
}

fn benchmark_classify(c: &mut Criterion) {
    let classifier = Classifier::default();
    let image = pseudo_vector(12345);
    let path = Path::new("bench.jpg");

    for n in [3usize, 100, 1000] {
        let index = label_index(n);
        c.bench_function(&format!("classify_{n}_labels"), |b| {
            b.iter(|| {
                let _ = classifier.classify(path, black_box(&image), &index);
            })
        });
    }
}

fn benchmark_decode(c: &mut Criterion) {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1024, 768, Rgb([120, 80, 200])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("encode bench image");
    let bytes = buf.into_inner();
    let decoder = ImageDecoder::new(LimitsConfig::default());

    c.bench_function("decode_png_1024x768", |b| {
        b.iter(|| {
            let _ = decoder.decode(black_box(&bytes), Path::new("bench.png"));
        })
    });
}

fn benchmark_preprocess(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(1920, 1080);

    c.bench_function("clip_preprocess_224", |b| {
        b.iter(|| {
            let _ = preprocess(black_box(&img), 224);
        })
    });
}

criterion_group!(
    benches,
    benchmark_classify,
    benchmark_decode,
    benchmark_preprocess,
);
criterion_main!(benches);

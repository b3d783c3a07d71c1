use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use rand::{SeedableRng, rngs::StdRng};
use wally_core::{AugmentationRanges, Classifier, CutoutAsset, ScanConfig, composite, scan};

/// Mean-brightness scorer so the bench measures the pipeline, not a network.
struct Brightness;

impl Classifier for Brightness {
    fn input_size(&self) -> u32 {
        50
    }

    fn predict(&self, tile: &RgbImage) -> anyhow::Result<f32> {
        let sum: u64 = tile.as_raw().iter().map(|&v| v as u64).sum();
        Ok(sum as f32 / (tile.as_raw().len() as f32 * 255.0))
    }
}

fn build_scene() -> RgbImage {
    RgbImage::from_fn(1024, 768, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8])
    })
}

fn build_cutouts() -> Vec<CutoutAsset> {
    let icon = RgbaImage::from_fn(64, 64, |x, y| {
        let inside = (x as i32 - 32).pow(2) + (y as i32 - 32).pow(2) < 900;
        if inside {
            Rgba([230, 30, 30, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    vec![CutoutAsset::new(icon).expect("cutout")]
}

fn composite_benchmark(c: &mut Criterion) {
    let cutouts = build_cutouts();
    let ranges = AugmentationRanges::default();
    let mut group = c.benchmark_group("composite");
    for size in [50u32, 100, 150] {
        let background = RgbImage::from_pixel(size, size, Rgb([90, 110, 130]));
        let mut rng = StdRng::seed_from_u64(1);
        group.bench_with_input(BenchmarkId::from_parameter(size), &background, |b, bg| {
            b.iter(|| {
                composite(black_box(bg), &cutouts, &ranges, &mut rng).expect("composite");
            });
        });
    }
    group.finish();
}

fn scan_benchmark(c: &mut Criterion) {
    let scene = build_scene();
    let mut group = c.benchmark_group("scan");
    group.sample_size(10);
    for (label, parallel) in [("sequential", false), ("parallel", true)] {
        let config = ScanConfig {
            parallel,
            ..ScanConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(label), &config, |b, cfg| {
            b.iter(|| {
                scan(black_box(&scene), cfg, &Brightness).expect("scan");
            });
        });
    }
    group.finish();
}

criterion_group!(benches, composite_benchmark, scan_benchmark);
criterion_main!(benches);

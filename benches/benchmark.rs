use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;

use glof_watch::assess;
use glof_watch::config::EstimatorConfig;
use glof_watch::processing::indices::derive_water_index;
use glof_watch::processing::resolver::{DerivedFromBands, MaskResolver};

/// Synthetic 10980x10980 would be a full Sentinel-2 tile; 2048² keeps runs short
const SIZE: (usize, usize) = (2048, 2048);

fn synthetic_bands() -> (Array2<f32>, Array2<f32>) {
    let green = Array2::from_shape_fn(SIZE, |(r, c)| 1500.0 + ((r * 7 + c) % 900) as f32);
    let nir = Array2::from_shape_fn(SIZE, |(r, c)| 1200.0 + ((r + c * 3) % 1300) as f32);
    (green, nir)
}

/// Benchmark NDWI derivation in isolation
fn benchmark_ndwi(c: &mut Criterion) {
    let (green, nir) = synthetic_bands();

    c.bench_function("ndwi_derivation", |b| {
        b.iter(|| derive_water_index(black_box(&green), black_box(&nir)).unwrap())
    });
}

/// Benchmark mask resolution plus assessment of two scenes
fn benchmark_assessment(c: &mut Criterion) {
    let (green, nir) = synthetic_bands();
    let config = EstimatorConfig::default();
    let mask_t1 = DerivedFromBands::new(green.clone(), nir.clone())
        .resolve(&config)
        .unwrap();
    let mask_t2 = DerivedFromBands::new(green.mapv(|g| g * 1.05), nir)
        .resolve(&config)
        .unwrap();

    c.bench_function("lake_assessment", |b| {
        b.iter(|| assess(black_box(&mask_t1), black_box(&mask_t2)).unwrap())
    });
}

criterion_group!(benches, benchmark_ndwi, benchmark_assessment);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use grblc_rust::algorithms::{compute_color_evolution, match_rescaling_factors, rescale};
use grblc_rust::core::{Observation, ObservationTable};
use std::hint::black_box;

/// Synthetic afterglow: a dense reference band plus three sparser bands
/// sampled slightly off the reference epochs.
fn synthetic_curve(reference_points: usize) -> ObservationTable {
    let mut rows = Vec::with_capacity(reference_points * 2);
    for i in 0..reference_points {
        let log_t = 2.0 + 4.0 * i as f64 / reference_points as f64;
        let t = 10f64.powf(log_t);
        let mag = 15.0 + 1.2 * log_t;
        rows.push(Observation::new(t, mag, 0.05, "R"));

        if i % 2 == 0 {
            rows.push(Observation::new(t * 1.01, mag + 0.4, 0.08, "V"));
        }
        if i % 3 == 0 {
            rows.push(Observation::new(t * 0.99, mag - 0.3 + 0.5 * log_t, 0.1, "B"));
        }
        if i % 5 == 0 {
            rows.push(Observation::new(t * 1.005, mag + 0.9, 0.12, "I"));
        }
    }
    rows.into_iter().collect()
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");

    for size in [50, 500, 5000] {
        let table = synthetic_curve(size);
        group.bench_with_input(BenchmarkId::new("match_rescaling_factors", size), &table, |b, table| {
            b.iter(|| match_rescaling_factors(black_box(table), "R"));
        });
    }

    group.finish();
}

fn bench_color_evolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("color_evolution");

    for size in [50, 500, 5000] {
        let table = synthetic_curve(size);
        group.bench_with_input(BenchmarkId::new("compute_color_evolution", size), &table, |b, table| {
            b.iter(|| compute_color_evolution(black_box(table), "R"));
        });
    }

    group.finish();
}

fn bench_rescale(c: &mut Criterion) {
    let mut group = c.benchmark_group("rescale");

    let table = synthetic_curve(1000);
    let report = match compute_color_evolution(&table, "R") {
        Ok(report) => report,
        Err(e) => panic!("synthetic curve must be analyzable: {}", e),
    };

    group.bench_function("rescale_1000", |b| {
        b.iter(|| rescale(black_box(&table), "R", &report, false));
    });
    group.bench_function("rescale_1000_remove_duplicates", |b| {
        b.iter(|| rescale(black_box(&table), "R", &report, true));
    });

    group.finish();
}

criterion_group!(benches, bench_matching, bench_color_evolution, bench_rescale);
criterion_main!(benches);

//! Benchmarks for the sales metrics engine.
//!
//! Covers: the full metrics snapshot, trend strength regression, momentum.

use analyzer::MetricsEngine;
use chrono::NaiveDate;
use common::Series;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_weekly_data(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 1000.0 + 300.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin())
        .collect()
}

fn generate_trend_weekly_data(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            1000.0
                + 2.5 * i as f64
                + 300.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin()
        })
        .collect()
}

fn make_series(values: Vec<f64>) -> Series {
    Series::daily(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values).unwrap()
}

fn bench_compute_snapshot(c: &mut Criterion) {
    let engine = MetricsEngine::new();
    let mut group = c.benchmark_group("compute_snapshot");

    for n in [30, 365, 1095, 3650] {
        let series = make_series(generate_trend_weekly_data(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, s| {
            b.iter(|| engine.compute(black_box(s)))
        });
    }

    group.finish();
}

fn bench_trend_strength(c: &mut Criterion) {
    let engine = MetricsEngine::new();
    let mut group = c.benchmark_group("trend_strength");

    for n in [100, 1000, 10000] {
        let data = generate_trend_weekly_data(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, d| {
            b.iter(|| engine.trend_strength(black_box(d)))
        });
    }

    group.finish();
}

fn bench_momentum(c: &mut Criterion) {
    let engine = MetricsEngine::new();
    let mut group = c.benchmark_group("momentum");

    for n in [100, 1000, 10000] {
        let data = generate_weekly_data(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, d| {
            b.iter(|| engine.momentum(black_box(d)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compute_snapshot,
    bench_trend_strength,
    bench_momentum
);
criterion_main!(benches);

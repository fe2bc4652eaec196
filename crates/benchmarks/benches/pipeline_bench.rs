//! End-to-end pipeline benchmarks.
//!
//! Covers: `run()` with the process capabilities, and with the naive chain
//! only, across data patterns.

use chrono::{Days, NaiveDate};
use common::{CellValue, PipelineConfig, RawTable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use predictor::Pipeline;
use selector::{Capabilities, ForecastEngine};

fn make_table(values: Vec<f64>) -> RawTable {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let rows = values
        .into_iter()
        .enumerate()
        .map(|(i, v)| vec![CellValue::from(base + Days::new(i as u64)), v.into()])
        .collect();
    RawTable::from_rows(&["Date", "Revenue"], rows)
}

fn generate_trend_weekly(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            1000.0
                + 1.5 * i as f64
                + 250.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin()
        })
        .collect()
}

fn generate_stationary(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let frac = ((state >> 33) as f64) / (u32::MAX as f64);
            1000.0 + (frac * 2.0 - 1.0) * 100.0
        })
        .collect()
}

fn naive_pipeline() -> Pipeline {
    let config = PipelineConfig::default();
    let engine = ForecastEngine::with_capabilities(&config.forecast, Capabilities::baseline());
    Pipeline::with_engine(&config, engine)
}

fn bench_pipeline_trend_weekly(c: &mut Criterion) {
    let pipeline = Pipeline::default();
    let mut group = c.benchmark_group("pipeline_trend_weekly");
    group.sample_size(10); // Seasonal fitting dominates

    for n in [90, 365, 730] {
        let table = make_table(generate_trend_weekly(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &table, |b, t| {
            b.iter(|| pipeline.run(black_box(t), 90))
        });
    }

    group.finish();
}

fn bench_pipeline_stationary(c: &mut Criterion) {
    let pipeline = Pipeline::default();
    let mut group = c.benchmark_group("pipeline_stationary");
    group.sample_size(10);

    for n in [90, 365, 730] {
        let table = make_table(generate_stationary(n, 42));
        group.bench_with_input(BenchmarkId::from_parameter(n), &table, |b, t| {
            b.iter(|| pipeline.run(black_box(t), 90))
        });
    }

    group.finish();
}

fn bench_pipeline_naive_only(c: &mut Criterion) {
    let pipeline = naive_pipeline();
    let mut group = c.benchmark_group("pipeline_naive_only");

    for n in [90, 365, 730, 3650] {
        let table = make_table(generate_trend_weekly(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &table, |b, t| {
            b.iter(|| pipeline.run(black_box(t), 90))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_pipeline_trend_weekly,
    bench_pipeline_stationary,
    bench_pipeline_naive_only
);
criterion_main!(benches);

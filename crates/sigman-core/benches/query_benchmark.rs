//! Benchmarks for the hot query paths
//!
//! Analysis procedures call these in tight loops over long recordings:
//! - interpolated lookups and resampled slices on waveforms
//! - binary-search range queries and sorted insertion on point sets
//! - common range computation on a populated registry

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sigman_core::{EventPointSet, Resolution, SignalRegistry, Waveform};

fn ecg_like(seconds: f64, rate: f64) -> Waveform {
    let count = (seconds * rate) as usize;
    let values = (0..count)
        .map(|i| {
            let t = i as f64 / rate;
            (2.0 * std::f64::consts::PI * 1.2 * t).sin() + 0.1 * (2.0 * std::f64::consts::PI * 50.0 * t).sin()
        })
        .collect();
    Waveform::new(values, seconds, "ecg").unwrap()
}

fn beats(seconds: f64) -> EventPointSet {
    let count = (seconds / 0.8) as usize;
    let times = (0..count).map(|i| i as f64 * 0.8 + 0.1).collect();
    EventPointSet::new(times, vec![1.0; count], "r").unwrap()
}

fn bench_waveform_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("waveform");
    let wave = ecg_like(600.0, 1000.0);

    group.bench_function("value_at", |b| {
        let mut t = 0.0;
        b.iter(|| {
            t = (t + 0.0137) % 599.0;
            black_box(wave.value_at(black_box(t)).unwrap())
        })
    });

    for &count in &[100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("slice_resampled", count), &count, |b, &count| {
            b.iter(|| black_box(wave.slice(100.0, 110.0, Resolution::Count(count)).unwrap()))
        });
    }

    group.bench_function("slice_native", |b| {
        b.iter(|| black_box(wave.slice(100.0, 110.0, Resolution::Native).unwrap()))
    });

    group.finish();
}

fn bench_point_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("points");
    let points = beats(3600.0);

    group.bench_function("index_range", |b| {
        b.iter(|| black_box(points.index_range(black_box(1200.0), black_box(1260.0))))
    });

    group.bench_function("insert_remove", |b| {
        let mut working = points.clone();
        b.iter(|| {
            working.insert(black_box(1800.05), 2.0).unwrap();
            black_box(working.remove_nearest(1800.05, Some(2.0)).unwrap())
        })
    });

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let mut registry = SignalRegistry::new();
    for (i, label) in ["ecg", "bp", "ppg", "resp"].iter().enumerate() {
        let wave = ecg_like(300.0, 250.0).with_offset(i as f64 * 0.5).unwrap();
        registry.add_wave(wave, Some(*label), false).unwrap();
    }
    registry.add_points(beats(300.0), None, false).unwrap();

    c.bench_function("registry/common_range", |b| {
        b.iter(|| black_box(registry.common_range(&["ecg", "bp", "ppg", "resp"]).unwrap()))
    });
    c.bench_function("registry/overall_span", |b| b.iter(|| black_box(registry.overall_span())));
}

criterion_group!(benches, bench_waveform_queries, bench_point_queries, bench_registry);
criterion_main!(benches);

// File: crates/plot-core/benches/scale_bench.rs
// Summary: Vectorised scale mapping and DataRange1d recomputation over growing inputs.

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use plot_core::range::shared;
use plot_core::types::{PlotId, RendererId};
use plot_core::{BBox, DataRange1d, Dimension, Interval, Range1d, Scale, ScaleKind};

fn bench_v_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("v_compute");
    for &n in &[10_000usize, 100_000] {
        let xs: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 * 0.37).collect();
        for kind in [ScaleKind::Linear, ScaleKind::Log] {
            let end = xs.last().copied().unwrap_or(1.0);
            let scale = Scale::new(kind, shared(Range1d::new(1.0, end)), Interval::new(0.0, 1920.0));
            group.bench_with_input(BenchmarkId::new(format!("{kind:?}"), n), &xs, |b, xs| {
                b.iter(|| black_box(scale.v_compute(xs)));
            });
        }
    }
    group.finish();
}

fn bench_data_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("data_range_update");
    for &n in &[10usize, 1_000] {
        let bounds: BTreeMap<RendererId, BBox> = (0..n)
            .map(|i| (RendererId::fresh(), BBox::new(0.0, -(i as f64), 1.0, i as f64 * 2.0)))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &bounds, |b, bounds| {
            let plot = PlotId::fresh();
            b.iter(|| {
                let mut r = DataRange1d::default();
                r.update(bounds, Dimension::Y, plot, None);
                black_box((r.start(), r.end()));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_v_compute, bench_data_range);
criterion_main!(benches);

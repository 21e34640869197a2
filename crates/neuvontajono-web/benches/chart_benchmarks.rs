//! Benchmarks for queue graph layout

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use neuvontajono_web::chart::{ChartGeometry, LineChart, parse_points};
use std::hint::black_box;

/// One sample every `step` minutes between 8:00 and 20:00
fn session_samples(step: u16) -> Vec<String> {
    (8 * 60..20 * 60)
        .step_by(usize::from(step))
        .enumerate()
        .map(|(i, minutes)| format!("{minutes}|{}", i % 17))
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_parsing");

    for step in [1u16, 5, 15] {
        let samples = session_samples(step);
        group.throughput(Throughput::Elements(samples.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_points", step), &samples, |b, samples| {
            b.iter(|| parse_points(black_box(samples)));
        });
    }

    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("chart_layout");

    for step in [1u16, 5, 15] {
        let samples = session_samples(step);
        group.bench_with_input(BenchmarkId::new("from_samples", step), &samples, |b, samples| {
            b.iter(|| LineChart::from_samples(black_box(samples), ChartGeometry::default()));
        });
    }

    let mut malformed = session_samples(5);
    for sample in malformed.iter_mut().step_by(3) {
        sample.push_str("|garbage");
    }
    group.bench_function("from_samples_with_malformed", |b| {
        b.iter(|| LineChart::from_samples(black_box(&malformed), ChartGeometry::default()));
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_layout);
criterion_main!(benches);

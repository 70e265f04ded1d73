//! Log analysis performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use logsift::services::{chunker, exporter, extractor};

/// Synthetic log with a mix of error, warning and info lines
fn create_log(lines: usize) -> String {
    (0..lines)
        .map(|i| {
            let minute = i % 60;
            let hour = 8 + (i / 600) % 12;
            match i % 5 {
                0 => format!("[2025-01-19 {:02}:{:02}:00] ERROR 500: Internal server error\n", hour, minute),
                1 => format!("[2025-01-19 {:02}:{:02}:10] ERROR 404: Resource /item/{} not found\n", hour, minute, i % 17),
                2 => format!("[2025-01-19 {:02}:{:02}:20] WARN: slow response\n", hour, minute),
                3 => "ERROR: Disk quota exceeded\n".to_string(),
                _ => format!("[2025-01-19 {:02}:{:02}:40] INFO: request {} served\n", hour, minute, i),
            }
        })
        .collect()
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");

    for lines in [1_000, 10_000, 50_000] {
        let log = create_log(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &log, |b, log| {
            b.iter(|| extractor::extract(black_box(log)))
        });
    }

    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let log = create_log(50_000);
    let mut group = c.benchmark_group("split");

    for max_chars in [2_000, 14_000] {
        group.bench_with_input(BenchmarkId::new("no_overlap", max_chars), &max_chars, |b, &max| {
            b.iter(|| chunker::split(black_box(&log), max))
        });
        group.bench_with_input(BenchmarkId::new("overlap_200", max_chars), &max_chars, |b, &max| {
            b.iter(|| chunker::split_with_overlap(black_box(&log), max, 200))
        });
    }

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let analysis = extractor::extract(&create_log(10_000));

    c.bench_function("to_csv", |b| b.iter(|| exporter::to_csv(black_box(&analysis.records))));
}

criterion_group!(benches, bench_extract, bench_split, bench_export);
criterion_main!(benches);

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use logmerge::config::FilterConfig;
use logmerge::normalize::{clean_line, normalize_line, NormalizedRecord};
use logmerge::sort::{finalize, sort_records};

fn sample_lines(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            format!(
                "202401{:02};{:02}{:02}{:02};worker-{} handled request {} in {}ms",
                (i * 7) % 28 + 1,
                (i * 13) % 24,
                (i * 17) % 60,
                (i * 31) % 60,
                i % 16,
                i,
                i % 900
            )
        })
        .collect()
}

fn sample_records(count: usize) -> Vec<NormalizedRecord> {
    let label: Arc<str> = Arc::from("bench");
    sample_lines(count)
        .iter()
        .filter_map(|line| normalize_line(line, &label))
        .collect()
}

fn bench_normalize_ascii(c: &mut Criterion) {
    let label: Arc<str> = Arc::from("app");
    let line = "20240115;083000;GET /api/v1/users 200 12ms";
    c.bench_function("normalize_ascii", |b| {
        b.iter(|| {
            black_box(normalize_line(black_box(line), &label));
        });
    });
}

fn bench_normalize_rejected(c: &mut Criterion) {
    let label: Arc<str> = Arc::from("app");
    let line = "-- header line without a date --";
    c.bench_function("normalize_rejected", |b| {
        b.iter(|| {
            black_box(normalize_line(black_box(line), &label));
        });
    });
}

fn bench_clean_control_chars(c: &mut Criterion) {
    let line = "20240115;083000;\tбухгалтерия\x01 отчёт\x07 готов\r";
    c.bench_function("clean_control_chars", |b| {
        b.iter(|| {
            black_box(clean_line(black_box(line)));
        });
    });
}

fn bench_filter_verdict(c: &mut Criterion) {
    let filter = FilterConfig::new(Some("REQUEST"), ["heartbeat", "healthcheck"]);
    let line = "20240115;083000;worker-3 handled request 4411 in 87ms";
    c.bench_function("filter_verdict", |b| {
        b.iter(|| {
            black_box(filter.verdict(black_box(line)));
        });
    });
}

fn bench_sort_100k(c: &mut Criterion) {
    let records = sample_records(100_000);
    c.bench_function("sort_100k", |b| {
        b.iter_batched(
            || records.clone(),
            |mut batch| {
                sort_records(&mut batch);
                black_box(batch);
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_finalize_with_filter_100k(c: &mut Criterion) {
    let records = sample_records(100_000);
    let filter = FilterConfig::new(Some("worker-1"), Vec::<String>::new());
    c.bench_function("finalize_with_filter_100k", |b| {
        b.iter_batched(
            || records.clone(),
            |batch| black_box(finalize(batch, &filter)),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    merge_pipeline_benches,
    bench_normalize_ascii,
    bench_normalize_rejected,
    bench_clean_control_chars,
    bench_filter_verdict,
    bench_sort_100k,
    bench_finalize_with_filter_100k
);
criterion_main!(merge_pipeline_benches);

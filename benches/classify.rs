//! Classification benchmarks
//!
//! - Single-bug classify against the Firefox calendar
//! - Batch annotation (rayon when the `parallel` feature is on)
//! - Arrow table build from annotated bugs

use bz2db::pipeline::annotate_batch;
use bz2db::storage::BugTable;
use bz2db::train::{Classifier, ReleaseCalendar};
use bz2db::BugRecord;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const VERSIONS: [&str; 5] = ["trunk", "47 branch", "48 branch", "unspecified", "Firefox 49"];

/// Bugs spread over 2015-2016 with a mix of versions
fn create_bugs(count: u64) -> Vec<BugRecord> {
    (0..count)
        .map(|i| {
            let month = 4 + (i % 20);
            let (year, month) = (2015 + month / 12, month % 12 + 1);
            let day = 1 + i % 28;
            BugRecord::builder(
                i,
                format!("{year}-{month:02}-{day:02}T12:00:00Z"),
                VERSIONS[(i % 5) as usize],
            )
            .field("status", "NEW")
            .build()
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let classifier = Classifier::new(ReleaseCalendar::firefox());

    c.bench_function("classify_single", |b| {
        b.iter(|| {
            classifier
                .classify(black_box("2016-06-06T10:00:00Z"), black_box("47 branch"))
                .unwrap()
        });
    });
}

fn bench_annotate_batch(c: &mut Criterion) {
    let classifier = Classifier::new(ReleaseCalendar::firefox());
    let mut group = c.benchmark_group("annotate_batch");

    for size in [1_000u64, 10_000, 100_000] {
        let bugs = create_bugs(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bugs, |b, bugs| {
            b.iter(|| annotate_batch(&classifier, black_box(bugs.clone())));
        });
    }

    group.finish();
}

fn bench_table_build(c: &mut Criterion) {
    let classifier = Classifier::new(ReleaseCalendar::firefox());
    let tracking = vec!["cf_status_firefox48".to_string()];
    let mut group = c.benchmark_group("bug_table");

    for size in [1_000u64, 10_000] {
        let bugs = annotate_batch(&classifier, create_bugs(size)).annotated;
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bugs, |b, bugs| {
            b.iter(|| BugTable::from_records(&tracking, black_box(bugs)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_annotate_batch, bench_table_build);
criterion_main!(benches);

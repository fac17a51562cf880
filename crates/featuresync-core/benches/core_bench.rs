//! Criterion benchmarks for featuresync-core.
//!
//! ## Benchmark groups
//!
//! 1. **sort** — Bucket ordering, sequential and on the rayon pool.
//! 2. **grouping** — Single grouping passes at increasing levels.
//! 3. **multi_level** — Several levels over one shared sort.
//! 4. **compare** — Diffing two summaries that differ in a few groups.
//!
//! ## Running
//!
//! ```sh
//! cargo bench --manifest-path crates/featuresync-core/Cargo.toml
//! # Run only the grouping group:
//! cargo bench --manifest-path crates/featuresync-core/Cargo.toml -- grouping
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use _featuresync_core::models::IdAndValueDigests;
use _featuresync_core::sync::accumulator::DigestAlgorithm;
use _featuresync_core::sync::grouping::SortedRecords;
use _featuresync_core::sync::keys::VersionFeatures;
use _featuresync_core::sync::ordering::sort_records;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `n` synthetic feature records, ids derived from a counter.
fn synthetic_records(n: usize, revision: &str) -> Vec<IdAndValueDigests> {
    (0..n as u64)
        .map(|i| {
            let content = format!("feature-{i}:{revision}");
            DigestAlgorithm::Sha1.record(&i.to_be_bytes(), content.as_bytes())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Sort
// ---------------------------------------------------------------------------

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    let keys = VersionFeatures::by_id("bench");
    for &n in &[1_000usize, 50_000] {
        let records = synthetic_records(n, "r1");
        group.bench_with_input(BenchmarkId::new("sequential", n), &records, |b, records| {
            b.iter(|| {
                let mut copy = records.clone();
                sort_records(&mut copy, &keys, usize::MAX);
                black_box(copy);
            });
        });
        group.bench_with_input(BenchmarkId::new("parallel", n), &records, |b, records| {
            b.iter(|| {
                let mut copy = records.clone();
                sort_records(&mut copy, &keys, 0);
                black_box(copy);
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 2. Grouping
// ---------------------------------------------------------------------------

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");
    let sorted = SortedRecords::new(
        synthetic_records(50_000, "r1"),
        VersionFeatures::by_id("bench"),
    );
    for &level in &[0usize, 1, 2, 3] {
        group.bench_with_input(BenchmarkId::new("level", level), &level, |b, &level| {
            b.iter(|| black_box(sorted.group_for_level(level).unwrap()));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 3. Multi-level
// ---------------------------------------------------------------------------

fn bench_multi_level(c: &mut Criterion) {
    let sorted = SortedRecords::new(
        synthetic_records(50_000, "r1"),
        VersionFeatures::by_id("bench"),
    );
    let levels = [0usize, 1, 2, 3];
    c.bench_function("multi_level/parallel", |b| {
        b.iter(|| black_box(sorted.group_for_levels(&levels).unwrap()));
    });
    c.bench_function("multi_level/sequential", |b| {
        b.iter(|| {
            let summaries: Vec<_> = levels
                .iter()
                .map(|&level| sorted.group_for_level(level).unwrap())
                .collect();
            black_box(summaries)
        });
    });
}

// ---------------------------------------------------------------------------
// 4. Compare
// ---------------------------------------------------------------------------

fn bench_compare(c: &mut Criterion) {
    let ours = synthetic_records(20_000, "r1");
    let mut theirs = ours.clone();
    for i in (0..theirs.len()).step_by(997) {
        theirs[i] = DigestAlgorithm::Sha1.record(&(i as u64).to_be_bytes(), b"edited");
    }
    let keys = VersionFeatures::by_id("bench");
    let local = SortedRecords::new(ours, keys.clone()).group_for_level(2).unwrap();
    let remote = SortedRecords::new(theirs, keys).group_for_level(2).unwrap();

    c.bench_function("compare/level2", |b| {
        b.iter(|| black_box(local.compare(&remote).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_sort,
    bench_grouping,
    bench_multi_level,
    bench_compare
);
criterion_main!(benches);

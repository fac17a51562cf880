//! Level grouping engine.
//!
//! A grouping pass scans records in bucket order once. At level 0 every
//! record lands in a single group; at level `n` a new group starts whenever
//! the first `n` bytes of the bucket digest change. Each group's aggregate
//! digest is the hash of its members' payload digests in scan order.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::errors::SyncResult;
use crate::models::{ContentDigest, GroupPosition, LevelSummary};
use crate::sync::accumulator::{Accumulator, DigestAccumulator};
use crate::sync::guards::{clamp_level, prefix_len, GroupingConfig};
use crate::sync::keys::BucketKeyProvider;
use crate::sync::ordering::sort_records;
use crate::sync::summary::SummarySink;

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Receives the events of one grouping pass, in order: `begin`, zero or more
/// `group_completed`, `end`.
pub trait GroupSink {
    fn begin(&mut self, level: usize);

    fn group_completed(&mut self, position: &GroupPosition, digest: ContentDigest, size: u64);

    fn end(&mut self, max_group_size: u64);
}

/// Sink that forwards each completed group to a closure.
pub struct FnSink<F> {
    on_group: F,
    max_group_size: Option<u64>,
}

impl<F> FnSink<F>
where
    F: FnMut(&GroupPosition, ContentDigest, u64),
{
    pub fn new(on_group: F) -> Self {
        Self {
            on_group,
            max_group_size: None,
        }
    }

    /// The value passed to `end`, once the pass has finished.
    pub fn max_group_size(&self) -> Option<u64> {
        self.max_group_size
    }
}

impl<F> GroupSink for FnSink<F>
where
    F: FnMut(&GroupPosition, ContentDigest, u64),
{
    fn begin(&mut self, _level: usize) {
        self.max_group_size = None;
    }

    fn group_completed(&mut self, position: &GroupPosition, digest: ContentDigest, size: u64) {
        (self.on_group)(position, digest, size);
    }

    fn end(&mut self, max_group_size: u64) {
        self.max_group_size = Some(max_group_size);
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PassStats {
    groups: u64,
    max_group_size: u64,
}

struct OpenGroup {
    position: GroupPosition,
    size: u64,
}

/// Run one grouping pass over records already in bucket order.
///
/// Never fails: a level past a bucket digest's length compares the whole
/// digest instead. Whatever `accumulator` held before the call is discarded.
pub fn group_sorted<R, P, A, S>(
    records: &[R],
    provider: &P,
    level: usize,
    accumulator: &mut A,
    sink: &mut S,
) where
    P: BucketKeyProvider<R> + ?Sized,
    A: DigestAccumulator + ?Sized,
    S: GroupSink + ?Sized,
{
    debug!(level, records = records.len(), "grouping pass started");
    accumulator.finish();
    sink.begin(level);
    let stats = if level == 0 {
        group_all(records, provider, accumulator, sink)
    } else {
        group_by_prefix(records, provider, level, accumulator, sink)
    };
    sink.end(stats.max_group_size);
    debug!(
        level,
        groups = stats.groups,
        max_group_size = stats.max_group_size,
        "grouping pass finished"
    );
}

fn group_all<R, P, A, S>(
    records: &[R],
    provider: &P,
    accumulator: &mut A,
    sink: &mut S,
) -> PassStats
where
    P: BucketKeyProvider<R> + ?Sized,
    A: DigestAccumulator + ?Sized,
    S: GroupSink + ?Sized,
{
    if records.is_empty() {
        return PassStats::default();
    }
    for record in records {
        accumulator.update(provider.payload_digest(record).as_bytes());
    }
    let size = records.len() as u64;
    sink.group_completed(&GroupPosition::empty(), accumulator.finish(), size);
    PassStats {
        groups: 1,
        max_group_size: size,
    }
}

fn group_by_prefix<R, P, A, S>(
    records: &[R],
    provider: &P,
    level: usize,
    accumulator: &mut A,
    sink: &mut S,
) -> PassStats
where
    P: BucketKeyProvider<R> + ?Sized,
    A: DigestAccumulator + ?Sized,
    S: GroupSink + ?Sized,
{
    let mut stats = PassStats::default();
    let Some((first, rest)) = records.split_first() else {
        return stats;
    };

    let mut lengths = LengthCheck::new(level, provider.bucket_prefix_digest(first).len());
    let mut current = open_group(first, provider, level, accumulator);

    for record in rest {
        let bucket = provider.bucket_prefix_digest(record);
        lengths.observe(bucket.len());
        if bucket.has_prefix(&current.position) {
            accumulator.update(provider.payload_digest(record).as_bytes());
            current.size += 1;
            continue;
        }
        close_group(current, accumulator, sink, &mut stats);
        current = open_group(record, provider, level, accumulator);
    }

    // Boundaries are only detected on transitions; the last group is still open.
    close_group(current, accumulator, sink, &mut stats);
    stats
}

fn open_group<R, P, A>(record: &R, provider: &P, level: usize, accumulator: &mut A) -> OpenGroup
where
    P: BucketKeyProvider<R> + ?Sized,
    A: DigestAccumulator + ?Sized,
{
    let bucket = provider.bucket_prefix_digest(record);
    let mut position = GroupPosition::with_len(prefix_len(level, bucket.len()));
    position.set_from_digest(bucket);
    accumulator.update(provider.payload_digest(record).as_bytes());
    OpenGroup { position, size: 1 }
}

fn close_group<A, S>(group: OpenGroup, accumulator: &mut A, sink: &mut S, stats: &mut PassStats)
where
    A: DigestAccumulator + ?Sized,
    S: GroupSink + ?Sized,
{
    sink.group_completed(&group.position, accumulator.finish(), group.size);
    stats.groups += 1;
    stats.max_group_size = stats.max_group_size.max(group.size);
}

/// Flags bucket digests whose length differs from the first one seen.
struct LengthCheck {
    expected: usize,
    warned: bool,
}

impl LengthCheck {
    fn new(level: usize, expected: usize) -> Self {
        if level > expected {
            debug!(level, digest_len = expected, "level exceeds digest length, clamping");
        }
        Self {
            expected,
            warned: false,
        }
    }

    fn observe(&mut self, len: usize) {
        if len != self.expected && !self.warned {
            self.warned = true;
            warn!(
                expected = self.expected,
                actual = len,
                "bucket digests have inconsistent lengths, comparing clamped prefixes"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping request API
// ---------------------------------------------------------------------------

/// Records sorted once for grouping at any number of levels.
pub struct SortedRecords<R, P> {
    records: Vec<R>,
    provider: P,
    config: GroupingConfig,
}

impl<R, P> SortedRecords<R, P>
where
    R: Send + Sync,
    P: BucketKeyProvider<R> + Sync,
{
    pub fn new(records: Vec<R>, provider: P) -> Self {
        Self::with_config(records, provider, GroupingConfig::default())
    }

    pub fn with_config(mut records: Vec<R>, provider: P, config: GroupingConfig) -> Self {
        sort_records(&mut records, &provider, config.parallel_sort_threshold);
        Self {
            records,
            provider,
            config,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn accumulator(&self) -> Accumulator {
        self.config.algorithm.accumulator()
    }

    /// Stream the groups of `level` into a caller-supplied sink.
    ///
    /// Levels past `max_level` run at `max_level`.
    pub fn group_into<S: GroupSink + ?Sized>(&self, level: usize, sink: &mut S) {
        let level = clamp_level(level, self.config.max_level);
        group_sorted(&self.records, &self.provider, level, &mut self.accumulator(), sink);
    }

    pub fn group_for_level(&self, level: usize) -> SyncResult<LevelSummary> {
        let mut sink = SummarySink::new(&self.provider);
        self.group_into(level, &mut sink);
        sink.into_summary()
    }

    /// Summaries for several levels, computed concurrently over the shared sort.
    ///
    /// Results come back in the order of `levels`.
    pub fn group_for_levels(&self, levels: &[usize]) -> SyncResult<Vec<LevelSummary>> {
        info!(
            levels = levels.len(),
            records = self.records.len(),
            "grouping multiple levels"
        );
        levels
            .par_iter()
            .map(|&level| self.group_for_level(level))
            .collect()
    }
}

/// Sort `records` and summarize them at `level` with default configuration.
pub fn group_for_level<R, P>(records: Vec<R>, provider: P, level: usize) -> SyncResult<LevelSummary>
where
    R: Send + Sync,
    P: BucketKeyProvider<R> + Sync,
{
    SortedRecords::new(records, provider).group_for_level(level)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

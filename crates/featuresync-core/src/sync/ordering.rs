//! Deterministic record ordering that makes equal bucket prefixes contiguous.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::sync::keys::BucketKeyProvider;

/// Compare two records by bucket digest bytes, then by payload digest bytes.
///
/// Records equal under this order have identical digests, so their relative
/// order never changes a grouping result.
pub fn compare_records<R, P>(provider: &P, a: &R, b: &R) -> Ordering
where
    P: BucketKeyProvider<R> + ?Sized,
{
    provider
        .bucket_prefix_digest(a)
        .cmp(provider.bucket_prefix_digest(b))
        .then_with(|| provider.payload_digest(a).cmp(provider.payload_digest(b)))
}

/// Sort `records` in place for grouping.
///
/// Inputs with at least `parallel_threshold` records are sorted on the rayon
/// pool.
pub fn sort_records<R, P>(records: &mut [R], provider: &P, parallel_threshold: usize)
where
    R: Send,
    P: BucketKeyProvider<R> + Sync + ?Sized,
{
    if records.len() < 2 {
        return;
    }
    if records.len() >= parallel_threshold {
        records.par_sort_unstable_by(|a, b| compare_records(provider, a, b));
    } else {
        records.sort_unstable_by(|a, b| compare_records(provider, a, b));
    }
}

/// True when `records` is already in grouping order.
pub fn is_sorted<R, P>(records: &[R], provider: &P) -> bool
where
    P: BucketKeyProvider<R> + ?Sized,
{
    records
        .windows(2)
        .all(|pair| compare_records(provider, &pair[0], &pair[1]) != Ordering::Greater)
}

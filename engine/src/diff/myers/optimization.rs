//! Myers diff algorithm optimizations.
//!
//! Trimming the common prefix and suffix before the search shrinks N for the
//! usual case of a few edits in a large file, and pins the tie-break for
//! changes next to equal runs.

use crate::comparator::RangeComparator;

/// Number of leading elements `base` and `target` have in common.
pub(crate) fn common_prefix(base: &dyn RangeComparator, target: &dyn RangeComparator) -> usize {
    let limit = base.range_count().min(target.range_count());
    (0..limit)
        .take_while(|&i| base.ranges_equal(i, target, i))
        .count()
}

/// Number of trailing elements `base` and `target` have in common, not
/// reaching into the first `prefix` elements of either.
pub(crate) fn common_suffix(
    base: &dyn RangeComparator,
    target: &dyn RangeComparator,
    prefix: usize,
) -> usize {
    let (n, m) = (base.range_count(), target.range_count());
    let limit = n.min(m) - prefix;
    (1..=limit)
        .take_while(|&i| base.ranges_equal(n - i, target, m - i))
        .count()
}

//! Three-way diff algorithm.
use std::ops::Range;

use tracing::trace;

use crate::comparator::{RangeComparator, ranges_match};
use crate::contributor::Contributor;
use crate::diff::three_way::conflict::{ChangeRange, changes_overlap};
use crate::diff::{
    DiffAlgorithm, DiffLimits, DiffOp, DifferenceKind, RangeDifference, aligned_ranges,
};
use crate::error::EngineError;

/// Three-way diff of `left` and `right` against `ancestor`.
///
/// The returned records tile all three sequences: every element of every
/// contributor belongs to exactly one record, in order.
///
/// # Errors
///
/// Returns `ComplexityExceeded` when either underlying diff exhausts
/// `limits`. Both diffs share the same limits; no partial result is
/// produced.
pub fn diff_three_way<A: DiffAlgorithm + ?Sized>(
    ancestor: &dyn RangeComparator,
    left: &dyn RangeComparator,
    right: &dyn RangeComparator,
    algorithm: &A,
    limits: &DiffLimits,
) -> Result<Vec<RangeDifference>, EngineError> {
    let diff_left = algorithm.diff(ancestor, left, limits)?;
    let diff_right = algorithm.diff(ancestor, right, limits)?;

    let mut hunks = extract_changes(&diff_left, Contributor::Left);
    hunks.extend(extract_changes(&diff_right, Contributor::Right));
    hunks.sort_by_key(|h| (h.base_range.start, h.base_range.end));
    trace!(hunks = hunks.len(), "combining three-way hunks");

    let mut merger = Combiner::new(left, right);
    let mut i = 0;
    while i < hunks.len() {
        let mut j = i + 1;
        while j < hunks.len() && hunks[i..j].iter().any(|h| changes_overlap(h, &hunks[j])) {
            j += 1;
        }
        merger.push_group(&hunks[i..j]);
        i = j;
    }
    Ok(merger.finish(ancestor.range_count()))
}

/// Changed runs of a diff, with empty sides placed where they happen.
pub(crate) fn extract_changes(diff_ops: &[DiffOp], side: Contributor) -> Vec<ChangeRange> {
    aligned_ranges(diff_ops)
        .into_iter()
        .filter(|(_, _, changed)| *changed)
        .map(|(base_range, target_range, _)| ChangeRange {
            base_range,
            target_range,
            side,
        })
        .collect()
}

/// Walks the ancestor left to right, emitting records and tracking how far
/// each side has drifted from ancestor numbering.
struct Combiner<'a> {
    left: &'a dyn RangeComparator,
    right: &'a dyn RangeComparator,
    records: Vec<RangeDifference>,
    position: usize,
    left_delta: isize,
    right_delta: isize,
}

impl<'a> Combiner<'a> {
    fn new(left: &'a dyn RangeComparator, right: &'a dyn RangeComparator) -> Self {
        Self {
            left,
            right,
            records: Vec::new(),
            position: 0,
            left_delta: 0,
            right_delta: 0,
        }
    }

    fn shifted(range: &Range<usize>, delta_before: isize, delta_after: isize) -> Range<usize> {
        let start = range.start.saturating_add_signed(delta_before);
        let end = range.end.saturating_add_signed(delta_after);
        start..end
    }

    fn push_gap(&mut self, until: usize) {
        if until <= self.position {
            return;
        }
        let ancestor = self.position..until;
        self.records.push(RangeDifference::three_way(
            DifferenceKind::NoChange,
            ancestor.clone(),
            Self::shifted(&ancestor, self.left_delta, self.left_delta),
            Self::shifted(&ancestor, self.right_delta, self.right_delta),
        ));
        self.position = until;
    }

    fn push_group(&mut self, group: &[ChangeRange]) {
        let start = group
            .iter()
            .map(|h| h.base_range.start)
            .min()
            .unwrap_or(self.position);
        let end = group.iter().map(|h| h.base_range.end).max().unwrap_or(start);
        self.push_gap(start);

        let sum = |side| -> isize {
            group
                .iter()
                .filter(|h| h.side == side)
                .map(ChangeRange::delta)
                .sum()
        };
        let (left_after, right_after) = (
            self.left_delta + sum(Contributor::Left),
            self.right_delta + sum(Contributor::Right),
        );
        let ancestor = start..end;
        let left = Self::shifted(&ancestor, self.left_delta, left_after);
        let right = Self::shifted(&ancestor, self.right_delta, right_after);

        let touches = |side| group.iter().any(|h| h.side == side);
        let kind = match (touches(Contributor::Left), touches(Contributor::Right)) {
            (true, true) => DifferenceKind::Conflict,
            (true, false) => DifferenceKind::LeftChanged,
            _ => DifferenceKind::RightChanged,
        };
        let pseudo = kind == DifferenceKind::Conflict
            && ranges_match(self.left, left.clone(), self.right, right.clone());
        self.records.push(
            RangeDifference::three_way(kind, ancestor, left, right).with_pseudo_conflict(pseudo),
        );

        self.position = end;
        self.left_delta = left_after;
        self.right_delta = right_after;
    }

    fn finish(mut self, ancestor_len: usize) -> Vec<RangeDifference> {
        self.push_gap(ancestor_len);
        self.records
    }
}

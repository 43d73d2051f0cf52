//! Hunks of a two-way diff against the ancestor and their overlap rule.

use std::ops::Range;

use crate::contributor::Contributor;

/// One changed run of a side relative to the ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChangeRange {
    /// Element range in the ancestor.
    pub base_range: Range<usize>,
    /// Element range in the side.
    pub target_range: Range<usize>,
    /// The side this hunk belongs to.
    pub side: Contributor,
}

impl ChangeRange {
    /// Elements gained (or lost, if negative) on the side.
    pub(crate) fn delta(&self) -> isize {
        self.target_range.len() as isize - self.base_range.len() as isize
    }
}

/// Whether two hunks touch the same ancestor text.
///
/// Ranges that merely touch do not overlap. Two insertions at the same
/// point do, and so does an insertion strictly inside the other range.
pub(crate) fn changes_overlap(a: &ChangeRange, b: &ChangeRange) -> bool {
    let (ar, br) = (&a.base_range, &b.base_range);
    if ar.is_empty() && br.is_empty() {
        return ar.start == br.start;
    }
    ar.start < br.end && br.start < ar.end
}

//! Sequence differencing over range comparators.
//!
//! The algorithms here are used twice: once over the lines of the bound
//! documents, and again, lazily, over the tokens of a single difference.
//! Two-way results tile both sequences with `NoChange` and change records;
//! three-way results tile all three.

pub mod myers;
pub mod three_way;

use std::ops::Range;
use std::time::{Duration, Instant};

use crate::comparator::RangeComparator;
use crate::contributor::Contributor;
use crate::error::{ComplexityLimit, EngineError};

pub use myers::MyersDiff;
pub use three_way::diff_three_way;

/// A single diff operation representing the difference between two sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOp {
    /// Elements that are unchanged between both sequences.
    Equal {
        /// Start index in the old sequence (inclusive).
        old_start: usize,
        /// End index in the old sequence (exclusive).
        old_end: usize,
        /// Start index in the new sequence (inclusive).
        new_start: usize,
        /// End index in the new sequence (exclusive).
        new_end: usize,
    },
    /// Elements that were inserted in the new sequence.
    Insert {
        /// Start index in the new sequence (inclusive).
        new_start: usize,
        /// End index in the new sequence (exclusive).
        new_end: usize,
    },
    /// Elements that were deleted from the old sequence.
    Delete {
        /// Start index in the old sequence (inclusive).
        old_start: usize,
        /// End index in the old sequence (exclusive).
        old_end: usize,
    },
    /// Elements that were replaced (deleted and inserted).
    Replace {
        /// Start index in the old sequence (inclusive).
        old_start: usize,
        /// End index in the old sequence (exclusive).
        old_end: usize,
        /// Start index in the new sequence (inclusive).
        new_start: usize,
        /// End index in the new sequence (exclusive).
        new_end: usize,
    },
}

impl DiffOp {
    /// Returns the range affected in the old sequence, if applicable.
    #[must_use]
    pub fn old_range(&self) -> Option<Range<usize>> {
        match self {
            Self::Equal {
                old_start, old_end, ..
            }
            | Self::Delete { old_start, old_end }
            | Self::Replace {
                old_start, old_end, ..
            } => Some(*old_start..*old_end),
            Self::Insert { .. } => None,
        }
    }

    /// Returns the range affected in the new sequence, if applicable.
    #[must_use]
    pub fn new_range(&self) -> Option<Range<usize>> {
        match self {
            Self::Equal {
                new_start, new_end, ..
            }
            | Self::Insert { new_start, new_end }
            | Self::Replace {
                new_start, new_end, ..
            } => Some(*new_start..*new_end),
            Self::Delete { .. } => None,
        }
    }

    /// Returns true if this operation represents a change (not equal).
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::Equal { .. })
    }

    /// Returns the size of the operation in the old sequence.
    #[must_use]
    pub fn old_len(&self) -> usize {
        self.old_range().map_or(0, |r| r.len())
    }

    /// Returns the size of the operation in the new sequence.
    #[must_use]
    pub fn new_len(&self) -> usize {
        self.new_range().map_or(0, |r| r.len())
    }
}

/// Old and new ranges of every operation, with the empty side of inserts
/// and deletes placed where the operation happens.
#[must_use]
pub fn aligned_ranges(ops: &[DiffOp]) -> Vec<(Range<usize>, Range<usize>, bool)> {
    let (mut old_pos, mut new_pos) = (0, 0);
    ops.iter()
        .map(|op| {
            let old = op.old_range().unwrap_or(old_pos..old_pos);
            let new = op.new_range().unwrap_or(new_pos..new_pos);
            old_pos = old.end;
            new_pos = new.end;
            (old, new, op.is_change())
        })
        .collect()
}

/// Budget for a single diff run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffLimits {
    /// Longest edit script the search may explore.
    ///
    /// Memory grows with the square of the explored distance: a Myers run
    /// that reaches distance D keeps about D² positions (D = 4000 is about
    /// 128 MB) before it completes or fails.
    pub max_edit_distance: usize,
    /// Wall-clock limit for one run.
    pub timeout: Option<Duration>,
}

impl Default for DiffLimits {
    fn default() -> Self {
        Self {
            max_edit_distance: 4_000,
            timeout: Some(Duration::from_secs(5)),
        }
    }
}

impl DiffLimits {
    /// Limits that never trip.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_edit_distance: usize::MAX,
            timeout: None,
        }
    }

    pub(crate) fn start(&self) -> Budget {
        Budget {
            limits: *self,
            started: Instant::now(),
        }
    }
}

/// A running budget.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    limits: DiffLimits,
    started: Instant,
}

impl Budget {
    pub(crate) const fn max_edit_distance(&self) -> usize {
        self.limits.max_edit_distance
    }

    pub(crate) fn check_time(&self) -> Result<(), EngineError> {
        match self.limits.timeout {
            Some(limit) if self.started.elapsed() >= limit => {
                Err(EngineError::ComplexityExceeded(ComplexityLimit::Timeout(limit)))
            }
            _ => Ok(()),
        }
    }
}

/// Trait for diff algorithms.
///
/// Implementations can use different algorithms (Myers, patience,
/// histogram, ...) while the rest of the engine stays unchanged.
pub trait DiffAlgorithm: Send + Sync {
    /// Computes the operations transforming `base` into `target`.
    ///
    /// # Errors
    ///
    /// Returns `ComplexityExceeded` when `limits` are exhausted. No partial
    /// result is produced.
    fn diff(
        &self,
        base: &dyn RangeComparator,
        target: &dyn RangeComparator,
        limits: &DiffLimits,
    ) -> Result<Vec<DiffOp>, EngineError>;
}

/// Classification of one difference record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DifferenceKind {
    /// Identical on every present contributor.
    NoChange,
    /// Only the left side differs from the ancestor (or, two-way, only the
    /// left side carries text).
    LeftChanged,
    /// Only the right side differs from the ancestor (or, two-way, the right
    /// side carries replacement text).
    RightChanged,
    /// Both sides changed the same ancestor range.
    Conflict,
}

/// One record of a diff: a kind and a range of elements per contributor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeDifference {
    kind: DifferenceKind,
    pseudo_conflict: bool,
    ranges: [Option<Range<usize>>; 3],
}

impl RangeDifference {
    /// Creates a two-way record.
    #[must_use]
    pub fn two_way(kind: DifferenceKind, left: Range<usize>, right: Range<usize>) -> Self {
        Self {
            kind,
            pseudo_conflict: false,
            ranges: [None, Some(left), Some(right)],
        }
    }

    /// Creates a three-way record.
    #[must_use]
    pub fn three_way(
        kind: DifferenceKind,
        ancestor: Range<usize>,
        left: Range<usize>,
        right: Range<usize>,
    ) -> Self {
        Self {
            kind,
            pseudo_conflict: false,
            ranges: [Some(ancestor), Some(left), Some(right)],
        }
    }

    /// Flags a conflict whose two sides are identical.
    #[must_use]
    pub fn with_pseudo_conflict(mut self, pseudo: bool) -> Self {
        self.pseudo_conflict = pseudo && self.kind == DifferenceKind::Conflict;
        self
    }

    /// The record's kind.
    #[must_use]
    pub const fn kind(&self) -> DifferenceKind {
        self.kind
    }

    /// Whether this is a conflict whose left and right texts are identical.
    #[must_use]
    pub const fn is_pseudo_conflict(&self) -> bool {
        self.pseudo_conflict
    }

    /// Whether the record is anything but `NoChange`.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.kind != DifferenceKind::NoChange
    }

    /// Element range on `contributor`, if present.
    #[must_use]
    pub fn range(&self, contributor: Contributor) -> Option<Range<usize>> {
        self.ranges[contributor.index()].clone()
    }

    /// First element on `contributor` (0 if absent).
    #[must_use]
    pub fn start(&self, contributor: Contributor) -> usize {
        self.range(contributor).map_or(0, |r| r.start)
    }

    /// Number of elements on `contributor` (0 if absent).
    #[must_use]
    pub fn length(&self, contributor: Contributor) -> usize {
        self.range(contributor).map_or(0, |r| r.len())
    }

    /// Whether the record carries a range for `contributor`.
    #[must_use]
    pub fn has(&self, contributor: Contributor) -> bool {
        self.ranges[contributor.index()].is_some()
    }
}

/// Two-way diff of `left` against `right`.
///
/// Equal runs become `NoChange`; every gap becomes one change record tagged
/// `RightChanged` when the right side carries text and `LeftChanged` when it
/// is a pure deletion.
///
/// # Errors
///
/// Returns `ComplexityExceeded` when `limits` are exhausted.
pub fn diff_two_way<A: DiffAlgorithm + ?Sized>(
    left: &dyn RangeComparator,
    right: &dyn RangeComparator,
    algorithm: &A,
    limits: &DiffLimits,
) -> Result<Vec<RangeDifference>, EngineError> {
    let ops = algorithm.diff(left, right, limits)?;
    Ok(aligned_ranges(&ops)
        .into_iter()
        .map(|(old, new, changed)| {
            let kind = match (changed, new.is_empty()) {
                (false, _) => DifferenceKind::NoChange,
                (true, false) => DifferenceKind::RightChanged,
                (true, true) => DifferenceKind::LeftChanged,
            };
            RangeDifference::two_way(kind, old, new)
        })
        .collect())
}

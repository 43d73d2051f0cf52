//! Myers diff algorithm.
use crate::comparator::RangeComparator;
use crate::diff::myers::optimization::{common_prefix, common_suffix};
use crate::diff::{Budget, DiffAlgorithm, DiffLimits, DiffOp};
use crate::error::{ComplexityLimit, EngineError};

/// Myers diff algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct MyersDiff;

impl MyersDiff {
    /// Creates new instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DiffAlgorithm for MyersDiff {
    fn diff(
        &self,
        base: &dyn RangeComparator,
        target: &dyn RangeComparator,
        limits: &DiffLimits,
    ) -> Result<Vec<DiffOp>, EngineError> {
        let (n, m) = (base.range_count(), target.range_count());
        if n == 0 && m == 0 {
            return Ok(Vec::new());
        }
        let prefix = common_prefix(base, target);
        let suffix = common_suffix(base, target, prefix);
        let window = Window {
            base_start: prefix,
            base_len: n - prefix - suffix,
            target_start: prefix,
            target_len: m - prefix - suffix,
        };

        let mut ses = vec![EditOp::Keep; prefix];
        ses.extend(compute_ses(base, target, &window, &limits.start())?);
        ses.extend(std::iter::repeat_n(EditOp::Keep, suffix));
        Ok(convert_ses_to_diff_ops(&ses))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditOp {
    Insert,
    Delete,
    Keep,
}

/// The part of both sequences left after trimming.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Window {
    base_start: usize,
    base_len: usize,
    target_start: usize,
    target_len: usize,
}

pub(crate) fn compute_ses(
    base: &dyn RangeComparator,
    target: &dyn RangeComparator,
    window: &Window,
    budget: &Budget,
) -> Result<Vec<EditOp>, EngineError> {
    let (n, m) = (window.base_len, window.target_len);
    if n == 0 {
        return Ok(vec![EditOp::Insert; m]);
    }
    if m == 0 {
        return Ok(vec![EditOp::Delete; n]);
    }

    let max_d = (n + m).min(budget.max_edit_distance());
    let offset = max_d as isize + 1;
    let (n, m) = (n as isize, m as isize);
    let mut v: Vec<isize> = vec![0; 2 * max_d + 3];
    // trace[d] holds v[-d..=d] as it was before step d: O(D²) in total.
    let mut trace: Vec<Vec<isize>> = Vec::new();

    for d in 0..=max_d as isize {
        budget.check_time()?;
        trace.push(v[(offset - d) as usize..=(offset + d) as usize].to_vec());

        for k in (-d..=d).step_by(2) {
            let k_idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[k_idx - 1] < v[k_idx + 1]) {
                v[k_idx + 1]
            } else {
                v[k_idx - 1] + 1
            };
            let mut y = x - k;
            while x < n
                && y < m
                && base.ranges_equal(
                    window.base_start + x as usize,
                    target,
                    window.target_start + y as usize,
                )
            {
                x += 1;
                y += 1;
            }
            v[k_idx] = x;
            if x >= n && y >= m {
                return Ok(backtrack(&trace, n, m));
            }
        }
    }

    Err(EngineError::ComplexityExceeded(ComplexityLimit::EditDistance(
        budget.max_edit_distance(),
    )))
}

pub(crate) fn backtrack(trace: &[Vec<isize>], n: isize, m: isize) -> Vec<EditOp> {
    let (mut edits, mut x, mut y) = (Vec::new(), n, m);
    for (d, v) in trace.iter().enumerate().skip(1).rev() {
        let d = d as isize;
        let at = |k: isize| v[(k + d) as usize];
        let k = x - y;
        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k);
        let prev_y = prev_x - prev_k;
        while x > prev_x && y > prev_y {
            edits.push(EditOp::Keep);
            x -= 1;
            y -= 1;
        }
        edits.push(if x == prev_x {
            EditOp::Insert
        } else {
            EditOp::Delete
        });
        (x, y) = (prev_x, prev_y);
    }
    while x > 0 && y > 0 {
        edits.push(EditOp::Keep);
        x -= 1;
        y -= 1;
    }
    edits.reverse();
    edits
}

/// Folds an edit script into operations: every run of keeps becomes one
/// `Equal`, every run between keeps one `Insert`, `Delete` or `Replace`.
pub(crate) fn convert_ses_to_diff_ops(ses: &[EditOp]) -> Vec<DiffOp> {
    let (mut ops, mut bi, mut ti, mut i) = (Vec::new(), 0, 0, 0);
    while i < ses.len() {
        let (old_start, new_start) = (bi, ti);
        if ses[i] == EditOp::Keep {
            while i < ses.len() && ses[i] == EditOp::Keep {
                bi += 1;
                ti += 1;
                i += 1;
            }
            ops.push(DiffOp::Equal {
                old_start,
                old_end: bi,
                new_start,
                new_end: ti,
            });
            continue;
        }
        while i < ses.len() && ses[i] != EditOp::Keep {
            if ses[i] == EditOp::Delete {
                bi += 1;
            } else {
                ti += 1;
            }
            i += 1;
        }
        ops.push(match (old_start < bi, new_start < ti) {
            (true, false) => DiffOp::Delete {
                old_start,
                old_end: bi,
            },
            (false, _) => DiffOp::Insert {
                new_start,
                new_end: ti,
            },
            (true, true) => DiffOp::Replace {
                old_start,
                old_end: bi,
                new_start,
                new_end: ti,
            },
        });
    }
    ops
}

//! Three-way differencing.
//!
//! Ancestor→Left and Ancestor→Right are diffed independently and their
//! hunks combined by ancestor position. A hunk changed on one side only
//! keeps that side's tag; hunks from both sides that overlap on the ancestor
//! become a single `Conflict`.
//!
//! # Example
//!
//! ```
//! use mergeview_engine::comparator::LineComparator;
//! use mergeview_engine::diff::{DiffLimits, DifferenceKind, MyersDiff, diff_three_way};
//!
//! let ancestor = LineComparator::new("a\nb\nc", false);
//! let left = LineComparator::new("a\nB\nc", false);
//! let right = LineComparator::new("a\nX\nc", false);
//!
//! let records =
//!     diff_three_way(&ancestor, &left, &right, &MyersDiff::new(), &DiffLimits::default()).unwrap();
//! assert!(records.iter().any(|r| r.kind() == DifferenceKind::Conflict));
//! ```

pub mod algorithm;
pub(crate) mod conflict;

pub use algorithm::diff_three_way;

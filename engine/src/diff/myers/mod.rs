//! Myers' O(ND) shortest-edit-script search over comparator ranges.
//!
//! N is the combined length of both sides and D the size of the edit
//! script, so near-identical documents diff in close to linear time. The
//! search stops with `ComplexityExceeded` once D passes the configured
//! edit distance or the run passes its deadline.
//!
//! # Tie-breaking
//!
//! When several shortest edit scripts exist, the one whose common runs come
//! earliest and longest is produced, with "earliest" measured in the target,
//! the text a script produces:
//!
//! 1. The common prefix and suffix are matched first.
//! 2. On every diagonal the furthest-reaching path wins, so a common run is
//!    followed to its end once entered.
//! 3. When the two candidate predecessors of a diagonal reach equally far,
//!    the path that consumed a base element is extended, so deletions are
//!    taken before insertions. Skipping base elements first lets the next
//!    target element be matched as soon as it can be: `a b` → `b a` keeps
//!    `b`, the first line of the target, and deletes `a` ahead of it.
//!
//! # Memory
//!
//! The search keeps one frontier per step for backtracking, so a script of
//! length D holds about D² positions. At the default edit-distance limit of
//! 4000 a run near the limit holds up to 16M positions (about 128 MB) before
//! it completes or gives up.

pub mod algorithm;
pub mod optimization;

pub use algorithm::MyersDiff;

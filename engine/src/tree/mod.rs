//! The diff tree.
//!
//! Each difference record is wrapped in a [`Diff`] node carrying one
//! anchored [`Span`] per present contributor. Top-level nodes form a
//! [`DiffSequence`]; token-level children are attached lazily.

mod builder;
mod heights;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::contributor::Contributor;
use crate::diff::{DifferenceKind, RangeDifference};
use crate::error::EngineError;
use crate::position::{Span, SpanGroup};

pub use builder::{TreeInput, build_diff_tree};
pub use heights::HeightIndex;

/// One difference, anchored in every present document.
pub struct Diff {
    index: usize,
    kind: DifferenceKind,
    pseudo_conflict: bool,
    three_way: bool,
    present: [bool; 3],
    spans: [Option<Span>; 3],
    heights: [usize; 3],
    resolved: Cell<bool>,
    children: OnceCell<Vec<Rc<Diff>>>,
}

impl Diff {
    pub(crate) fn new(
        index: usize,
        record: &RangeDifference,
        spans: [Option<Span>; 3],
        heights: [usize; 3],
    ) -> Self {
        let kind = record.kind();
        Self {
            index,
            kind,
            pseudo_conflict: record.is_pseudo_conflict(),
            three_way: record.has(Contributor::Ancestor),
            present: Contributor::ALL.map(|c| record.has(c)),
            spans,
            heights,
            resolved: Cell::new(false),
            // Unchanged regions are never refined.
            children: if kind == DifferenceKind::NoChange {
                OnceCell::with_value(Vec::new())
            } else {
                OnceCell::new()
            },
        }
    }

    /// Position in document order within its sequence.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The classification as of the last recompute.
    #[must_use]
    pub const fn kind(&self) -> DifferenceKind {
        self.kind
    }

    /// Whether this is a conflict whose two sides are identical.
    #[must_use]
    pub const fn is_pseudo_conflict(&self) -> bool {
        self.pseudo_conflict
    }

    /// Whether this node is anything but `NoChange`.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.kind != DifferenceKind::NoChange
    }

    /// Whether the node came from a three-way comparison.
    #[must_use]
    pub const fn is_three_way(&self) -> bool {
        self.three_way
    }

    /// The anchored range on `contributor`, if present.
    #[must_use]
    pub fn span(&self, contributor: Contributor) -> Option<&Span> {
        self.spans[contributor.index()].as_ref()
    }

    /// Contributors the node's record covers.
    pub fn contributors(&self) -> impl Iterator<Item = Contributor> + '_ {
        Contributor::ALL
            .into_iter()
            .filter(|&c| self.present[c.index()])
    }

    /// Line count on `contributor` at build time.
    #[must_use]
    pub const fn height(&self, contributor: Contributor) -> usize {
        self.heights[contributor.index()]
    }

    /// Line count on the ancestor at build time.
    #[must_use]
    pub const fn ancestor_height(&self) -> usize {
        self.height(Contributor::Ancestor)
    }

    /// Line count on the left at build time.
    #[must_use]
    pub const fn left_height(&self) -> usize {
        self.height(Contributor::Left)
    }

    /// Line count on the right at build time.
    #[must_use]
    pub const fn right_height(&self) -> usize {
        self.height(Contributor::Right)
    }

    /// The tallest present contributor: the node's virtual height.
    #[must_use]
    pub fn max_height(&self) -> usize {
        self.contributors().map(|c| self.height(c)).max().unwrap_or(0)
    }

    /// Whether a merge copy has settled this node. Always false for two-way
    /// nodes.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get()
    }

    pub(crate) fn set_resolved(&self, resolved: bool) {
        if self.three_way {
            self.resolved.set(resolved);
        }
    }

    /// Whether navigation should stop on this node.
    #[must_use]
    pub fn is_navigable(&self, show_pseudo_conflicts: bool) -> bool {
        self.is_change() && (show_pseudo_conflicts || !self.pseudo_conflict)
    }

    /// Children computed so far, if refinement has run.
    #[must_use]
    pub fn cached_children(&self) -> Option<&[Rc<Self>]> {
        self.children.get().map(Vec::as_slice)
    }

    pub(crate) fn children_or_init(&self, init: impl FnOnce() -> Vec<Rc<Self>>) -> &[Rc<Self>] {
        self.children.get_or_init(init)
    }
}

impl fmt::Debug for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diff")
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("pseudo_conflict", &self.pseudo_conflict)
            .field("resolved", &self.resolved.get())
            .field(
                "ranges",
                &self
                    .spans
                    .iter()
                    .map(|s| s.as_ref().map(Span::range))
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// The ordered nodes of one comparison.
#[derive(Debug)]
pub struct DiffSequence {
    diffs: Vec<Rc<Diff>>,
    generation: u64,
    groups: std::cell::RefCell<Vec<SpanGroup>>,
    first_lines: [usize; 3],
    heights: OnceCell<HeightIndex>,
}

impl DiffSequence {
    /// Wraps the nodes built at `generation`.
    ///
    /// `group` is the span group of the nodes; `first_lines` the first line of
    /// each contributor's working region.
    #[must_use]
    pub fn new(
        diffs: Vec<Rc<Diff>>,
        generation: u64,
        group: SpanGroup,
        first_lines: [usize; 3],
    ) -> Self {
        Self {
            diffs,
            generation,
            groups: std::cell::RefCell::new(vec![group]),
            first_lines,
            heights: OnceCell::new(),
        }
    }

    /// All nodes in document order, `NoChange` included.
    #[must_use]
    pub fn diffs(&self) -> &[Rc<Diff>] {
        &self.diffs
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    /// Whether the sequence has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// Node at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Rc<Diff>> {
        self.diffs.get(index)
    }

    /// The edit generation this sequence was computed at.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// First line of `contributor`'s working region.
    #[must_use]
    pub const fn first_line(&self, contributor: Contributor) -> usize {
        self.first_lines[contributor.index()]
    }

    /// Span groups owned by this sequence, children included.
    #[must_use]
    pub fn groups(&self) -> Vec<SpanGroup> {
        self.groups.borrow().clone()
    }

    pub(crate) fn adopt_group(&self, group: SpanGroup) {
        self.groups.borrow_mut().push(group);
    }

    /// Block heights, built on first use.
    pub fn height_index(&self) -> &HeightIndex {
        self.heights.get_or_init(|| HeightIndex::new(&self.diffs))
    }

    /// Checks that on every contributor each node starts at or after the end
    /// of its predecessor.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` naming the first offending node.
    pub fn check_order(&self) -> Result<(), EngineError> {
        for contributor in Contributor::ALL {
            let mut end = 0;
            for diff in &self.diffs {
                let Some(span) = diff.span(contributor) else {
                    continue;
                };
                if span.offset() < end {
                    return Err(EngineError::InvariantViolation {
                        contributor,
                        index: diff.index(),
                    });
                }
                end = span.end();
            }
        }
        Ok(())
    }
}

//! Anchored ranges that follow document edits.
//!
//! A [`Span`] is a shared handle: the diff tree, the merger and UI state may
//! all hold clones of the same span and observe the same adjustments. The
//! [`PositionTracker`] owns the registry and applies every edit of a
//! registered document to that document's live spans.
//!
//! # Anchoring
//!
//! A replacement is applied as a deletion followed by an insertion.
//!
//! - A deletion clamps every endpoint inside the removed range to its
//!   start. Spans may become empty; they are never destroyed by editing.
//! - An insertion inside an [`AnchorKind::Inclusive`] or
//!   [`AnchorKind::Change`] span, exactly at its start or immediately past
//!   its end, grows the span. Within one [`SpanGroup`] a boundary insertion
//!   is owned by a single span so the group stays ordered. A span strictly
//!   containing the offset owns it. Otherwise a `Change` span touching the
//!   offset beats an `Inclusive` one, so typing at either edge of a
//!   difference grows the difference rather than its unchanged neighbor.
//!   Between spans of the same kind an empty span sitting on the offset
//!   wins, then the span starting there, then the span ending there. A span
//!   named with [`PositionTracker::prefer`] overrides all of this for the
//!   next edit. Every other span at or past the offset shifts.
//! - An [`AnchorKind::Region`] span shifts on an insertion at its start and
//!   does not grow at its end, unless the insertion replaces text the region
//!   held.

mod tracker;

use std::cell::Cell;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use crate::document::DocumentId;

pub use tracker::PositionTracker;

/// How a span reacts to insertions at its boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// Boundary insertions extend the span.
    Inclusive,
    /// Spans of changed text: like `Inclusive`, and preferred over an
    /// `Inclusive` neighbor sharing the boundary.
    Change,
    /// Working-region spans: boundary insertions stay outside.
    Region,
}

/// Spans that are ordered relative to each other and adjusted together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanGroup(u64);

impl SpanGroup {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SpanGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

struct SpanState {
    document: DocumentId,
    offset: Cell<usize>,
    len: Cell<usize>,
    kind: AnchorKind,
    group: SpanGroup,
    released: Cell<bool>,
}

/// An anchored `(offset, length)` range in one document.
#[derive(Clone)]
pub struct Span(Rc<SpanState>);

impl Span {
    pub(crate) fn new(
        document: DocumentId,
        range: Range<usize>,
        kind: AnchorKind,
        group: SpanGroup,
    ) -> Self {
        Self(Rc::new(SpanState {
            document,
            offset: Cell::new(range.start),
            len: Cell::new(range.len()),
            kind,
            group,
            released: Cell::new(false),
        }))
    }

    /// The document the span lives in.
    #[must_use]
    pub fn document(&self) -> DocumentId {
        self.0.document
    }

    /// Start offset in bytes.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.0.offset.get()
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len.get()
    }

    /// Whether the span covers no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// End offset in bytes (exclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset() + self.len()
    }

    /// The covered byte range.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.offset()..self.end()
    }

    /// The span's anchoring behavior.
    #[must_use]
    pub fn kind(&self) -> AnchorKind {
        self.0.kind
    }

    /// The group the span is adjusted with.
    #[must_use]
    pub fn group(&self) -> SpanGroup {
        self.0.group
    }

    /// Whether the tracker has stopped adjusting this span.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.0.released.get()
    }

    /// Whether `offset` falls in the span, counting an empty span as
    /// containing its own offset.
    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        if self.is_empty() {
            offset == self.offset()
        } else {
            self.range().contains(&offset)
        }
    }

    /// Whether the span intersects `range`. Empty ranges and spans intersect
    /// whatever contains their offset.
    #[must_use]
    pub fn intersects(&self, range: &Range<usize>) -> bool {
        match (self.is_empty(), range.is_empty()) {
            (true, true) => self.offset() == range.start,
            (true, false) => range.contains(&self.offset()),
            (false, true) => self.contains(range.start),
            (false, false) => self.offset() < range.end && range.start < self.end(),
        }
    }

    /// Whether both handles refer to the same span.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn set(&self, range: Range<usize>) {
        self.0.offset.set(range.start);
        self.0.len.set(range.len());
    }

    pub(crate) fn mark_released(&self) {
        self.0.released.set(true);
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("document", &self.document())
            .field("range", &self.range())
            .field("kind", &self.kind())
            .field("group", &self.group())
            .field("released", &self.is_released())
            .finish()
    }
}

//! Span registry and edit adjustment.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use tracing::{debug, error, trace};

use super::{AnchorKind, Span, SpanGroup};
use crate::document::{DocumentId, EditEvent, EditListener, SharedDocument};
use crate::error::EngineError;

/// Keeps the spans of registered documents in step with their edits.
///
/// Each registered document gets one listener, subscribed once, that owns
/// the document's live spans.
#[derive(Debug, Default)]
pub struct PositionTracker {
    documents: RefCell<HashMap<DocumentId, Rc<DocumentAnchors>>>,
    next_group: Cell<u64>,
}

#[derive(Debug)]
struct DocumentAnchors {
    len: Cell<usize>,
    spans: RefCell<Vec<Span>>,
    preferred: RefCell<Option<Span>>,
}

impl PositionTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `document`. Registering twice is a no-op.
    pub fn register(&self, document: &SharedDocument) {
        let mut doc = document.borrow_mut();
        let id = doc.id();
        if self.documents.borrow().contains_key(&id) {
            return;
        }
        let anchors = Rc::new(DocumentAnchors {
            len: Cell::new(doc.len()),
            spans: RefCell::new(Vec::new()),
            preferred: RefCell::new(None),
        });
        let listener: Rc<dyn EditListener> = anchors.clone();
        doc.subscribe(&listener);
        self.documents.borrow_mut().insert(id, anchors);
        debug!(document = %id, "registered document with position tracker");
    }

    /// Stops tracking `document` and releases all of its spans.
    pub fn unregister(&self, document: DocumentId) {
        if let Some(anchors) = self.documents.borrow_mut().remove(&document) {
            for span in anchors.spans.borrow_mut().drain(..) {
                span.mark_released();
            }
            debug!(document = %document, "unregistered document from position tracker");
        }
    }

    /// Whether `document` is tracked.
    #[must_use]
    pub fn is_registered(&self, document: DocumentId) -> bool {
        self.documents.borrow().contains_key(&document)
    }

    /// A fresh group for spans that must stay ordered relative to each
    /// other.
    pub fn new_group(&self) -> SpanGroup {
        let id = self.next_group.get();
        self.next_group.set(id + 1);
        SpanGroup::new(id)
    }

    /// Anchors `range` in `document`.
    ///
    /// Spans of one group must be created in document order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAnchor` if `document` is not registered and
    /// `InvalidRange` if `range` does not fit the document.
    pub fn anchor(
        &self,
        document: DocumentId,
        range: Range<usize>,
        kind: AnchorKind,
        group: SpanGroup,
    ) -> Result<Span, EngineError> {
        let anchors = self.anchors(document)?;
        let doc_len = anchors.len.get();
        if range.start > range.end || range.end > doc_len {
            return Err(EngineError::InvalidRange {
                offset: range.start,
                len: range.end.saturating_sub(range.start),
                doc_len,
            });
        }
        let span = Span::new(document, range, kind, group);
        anchors.spans.borrow_mut().push(span.clone());
        Ok(span)
    }

    /// Live spans of `document` that contain `offset`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAnchor` if `document` is not registered.
    pub fn spans_at(
        &self,
        document: DocumentId,
        offset: usize,
    ) -> Result<Vec<Span>, EngineError> {
        let anchors = self.anchors(document)?;
        let spans = anchors.spans.borrow();
        Ok(spans.iter().filter(|s| s.contains(offset)).cloned().collect())
    }

    /// Number of live spans in `document`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAnchor` if `document` is not registered.
    pub fn span_count(&self, document: DocumentId) -> Result<usize, EngineError> {
        Ok(self.anchors(document)?.spans.borrow().len())
    }

    /// Stops adjusting `span`. The handle keeps its last range.
    pub fn release(&self, span: &Span) {
        span.mark_released();
        if let Some(anchors) = self.documents.borrow().get(&span.document()) {
            anchors.spans.borrow_mut().retain(|s| !s.same(span));
        }
    }

    /// Makes `span` the owner of the next edit's insertion in its group,
    /// provided the insertion lands on or inside it.
    ///
    /// Used before replacing a span's text when group peers share its
    /// boundary, e.g. two empty spans at one offset. The hint is consumed by
    /// the next edit of the document.
    pub fn prefer(&self, span: &Span) {
        if span.is_released() {
            return;
        }
        if let Some(anchors) = self.documents.borrow().get(&span.document()) {
            *anchors.preferred.borrow_mut() = Some(span.clone());
        }
    }

    /// Releases every span of `group` in every document.
    pub fn release_group(&self, group: SpanGroup) {
        let mut released = 0;
        for anchors in self.documents.borrow().values() {
            anchors.spans.borrow_mut().retain(|s| {
                let keep = s.group() != group;
                if !keep {
                    s.mark_released();
                    released += 1;
                }
                keep
            });
        }
        trace!(%group, released, "released span group");
    }

    fn anchors(&self, document: DocumentId) -> Result<Rc<DocumentAnchors>, EngineError> {
        self.documents.borrow().get(&document).cloned().ok_or_else(|| {
            error!(document = %document, "span requested on unregistered document");
            EngineError::InvalidAnchor(document)
        })
    }
}

impl EditListener for DocumentAnchors {
    fn document_changed(&self, event: &EditEvent) {
        self.len.set(self.len.get() - event.removed + event.inserted);
        let preferred = self.preferred.borrow_mut().take();
        let spans = self.spans.borrow();
        let removed = event.offset..event.offset + event.removed;
        // Regions keep text that replaces text they held.
        let absorbing: Vec<bool> = spans
            .iter()
            .map(|s| {
                s.kind() == AnchorKind::Region && !removed.is_empty() && s.intersects(&removed)
            })
            .collect();
        if event.removed > 0 {
            for span in spans.iter() {
                apply_delete(span, event.offset, event.removed);
            }
        }
        if event.inserted > 0 {
            apply_insert(&spans, &absorbing, preferred.as_ref(), event.offset, event.inserted);
        }
        trace!(
            document = %event.document,
            offset = event.offset,
            removed = event.removed,
            inserted = event.inserted,
            spans = spans.len(),
            "adjusted spans"
        );
    }
}

fn apply_delete(span: &Span, offset: usize, removed: usize) {
    let map = |p: usize| {
        if p <= offset {
            p
        } else if p >= offset + removed {
            p - removed
        } else {
            offset
        }
    };
    span.set(map(span.offset())..map(span.end()));
}

fn apply_insert(
    spans: &[Span],
    absorbing: &[bool],
    preferred: Option<&Span>,
    offset: usize,
    inserted: usize,
) {
    let mut owners: HashMap<SpanGroup, (BoundaryRank, usize)> = HashMap::new();
    for (i, span) in spans.iter().enumerate() {
        let Some(rank) = boundary_rank(span, offset) else {
            continue;
        };
        let rank = if preferred.is_some_and(|p| p.same(span)) {
            BoundaryRank::Preferred
        } else {
            rank
        };
        owners
            .entry(span.group())
            .and_modify(|best| {
                if rank < best.0 {
                    *best = (rank, i);
                }
            })
            .or_insert((rank, i));
    }

    for (i, span) in spans.iter().enumerate() {
        let (start, end) = (span.offset(), span.end());
        let owner = owners.get(&span.group()).map(|&(_, owner)| owner);
        let grows = match span.kind() {
            AnchorKind::Inclusive | AnchorKind::Change => owner == Some(i),
            AnchorKind::Region => absorbing[i] || (start < offset && offset < end),
        };
        // Empty peers registered before the owner precede it in the document.
        let stays_before = span.kind() != AnchorKind::Region
            && span.is_empty()
            && start == offset
            && owner.is_some_and(|owner| i < owner);
        if grows {
            span.set(start..end + inserted);
        } else if start >= offset && !stays_before {
            span.set(start + inserted..end + inserted);
        }
    }
}

/// Claim of a span on an insertion at one of its boundaries; lower wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BoundaryRank {
    Preferred,
    Inside,
    Touching {
        /// `Change` spans come before `Inclusive` ones.
        inclusive: bool,
        edge: Edge,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Edge {
    Empty,
    Start,
    End,
}

fn boundary_rank(span: &Span, offset: usize) -> Option<BoundaryRank> {
    if span.kind() == AnchorKind::Region {
        return None;
    }
    let (start, end) = (span.offset(), span.end());
    if start < offset && offset < end {
        return Some(BoundaryRank::Inside);
    }
    let edge = if span.is_empty() && start == offset {
        Edge::Empty
    } else if start == offset {
        Edge::Start
    } else if end == offset {
        Edge::End
    } else {
        return None;
    };
    Some(BoundaryRank::Touching {
        inclusive: span.kind() == AnchorKind::Inclusive,
        edge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn setup(text: &str) -> (PositionTracker, SharedDocument, DocumentId) {
        let tracker = PositionTracker::new();
        let doc = Document::shared(text);
        tracker.register(&doc);
        let id = doc.borrow().id();
        (tracker, doc, id)
    }

    #[test]
    fn insertion_at_start_grows_the_span() {
        let (tracker, doc, id) = setup("aaa\nbbb\nccc\n");
        let group = tracker.new_group();
        let before = tracker.anchor(id, 0..4, AnchorKind::Inclusive, group).unwrap();
        let diff = tracker.anchor(id, 4..8, AnchorKind::Inclusive, group).unwrap();
        let after = tracker.anchor(id, 8..12, AnchorKind::Inclusive, group).unwrap();

        doc.borrow_mut().insert(4, "x").unwrap();
        assert_eq!(before.range(), 0..4);
        assert_eq!(diff.range(), 4..9);
        assert_eq!(after.range(), 9..13);
    }

    #[test]
    fn insertion_past_the_last_span_grows_it() {
        let (tracker, doc, id) = setup("abc");
        let group = tracker.new_group();
        let span = tracker.anchor(id, 1..3, AnchorKind::Inclusive, group).unwrap();
        doc.borrow_mut().insert(3, "de").unwrap();
        assert_eq!(span.range(), 1..5);
    }

    #[test]
    fn empty_span_owns_insertions_on_it() {
        let (tracker, doc, id) = setup("aabb");
        let group = tracker.new_group();
        let left = tracker.anchor(id, 0..2, AnchorKind::Inclusive, group).unwrap();
        let empty = tracker.anchor(id, 2..2, AnchorKind::Inclusive, group).unwrap();
        let right = tracker.anchor(id, 2..4, AnchorKind::Inclusive, group).unwrap();

        doc.borrow_mut().insert(2, "zz").unwrap();
        assert_eq!(left.range(), 0..2);
        assert_eq!(empty.range(), 2..4);
        assert_eq!(right.range(), 4..6);
    }

    #[test]
    fn change_span_grows_at_both_edges() {
        let (tracker, doc, id) = setup("aa\nbb\ncc\n");
        let group = tracker.new_group();
        let before = tracker.anchor(id, 0..3, AnchorKind::Inclusive, group).unwrap();
        let change = tracker.anchor(id, 3..6, AnchorKind::Change, group).unwrap();
        let after = tracker.anchor(id, 6..9, AnchorKind::Inclusive, group).unwrap();

        doc.borrow_mut().insert(6, "Z").unwrap();
        assert_eq!(change.range(), 3..7);
        assert_eq!(after.range(), 7..10);

        doc.borrow_mut().insert(3, "Y").unwrap();
        assert_eq!(before.range(), 0..3);
        assert_eq!(change.range(), 3..8);
        assert_eq!(&doc.borrow().text()[change.range()], "Ybb\nZ");
    }

    #[test]
    fn adjacent_changes_prefer_the_one_starting_there() {
        let (tracker, doc, id) = setup("aabb");
        let group = tracker.new_group();
        let first = tracker.anchor(id, 0..2, AnchorKind::Change, group).unwrap();
        let second = tracker.anchor(id, 2..4, AnchorKind::Change, group).unwrap();

        doc.borrow_mut().insert(2, "x").unwrap();
        assert_eq!(first.range(), 0..2);
        assert_eq!(second.range(), 2..5);
    }

    #[test]
    fn empty_peer_before_the_owner_stays_put() {
        let (tracker, doc, id) = setup("aabb");
        let group = tracker.new_group();
        let gap = tracker.anchor(id, 2..2, AnchorKind::Inclusive, group).unwrap();
        let change = tracker.anchor(id, 2..4, AnchorKind::Change, group).unwrap();

        doc.borrow_mut().insert(2, "x").unwrap();
        assert_eq!(gap.range(), 2..2);
        assert_eq!(change.range(), 2..5);
    }

    #[test]
    fn preferred_span_owns_the_next_insertion() {
        let (tracker, doc, id) = setup("a\nc\n");
        let group = tracker.new_group();
        let head = tracker.anchor(id, 0..2, AnchorKind::Inclusive, group).unwrap();
        let first = tracker.anchor(id, 2..2, AnchorKind::Change, group).unwrap();
        let second = tracker.anchor(id, 2..2, AnchorKind::Change, group).unwrap();
        let tail = tracker.anchor(id, 2..4, AnchorKind::Inclusive, group).unwrap();

        tracker.prefer(&second);
        doc.borrow_mut().insert(2, "b\n").unwrap();
        assert_eq!(head.range(), 0..2);
        assert_eq!(first.range(), 2..2);
        assert_eq!(second.range(), 2..4);
        assert_eq!(tail.range(), 4..6);

        // The hint is spent: the first empty span owns the next insertion.
        doc.borrow_mut().insert(2, "X\n").unwrap();
        assert_eq!(first.range(), 2..4);
        assert_eq!(second.range(), 4..6);
        assert_eq!(doc.borrow().text(), "a\nX\nb\nc\n");
    }

    #[test]
    fn preferred_span_owns_a_replacement_of_its_text() {
        let (tracker, doc, id) = setup("abcd");
        let group = tracker.new_group();
        let empty = tracker.anchor(id, 2..2, AnchorKind::Change, group).unwrap();
        let target = tracker.anchor(id, 2..3, AnchorKind::Change, group).unwrap();
        let tail = tracker.anchor(id, 3..4, AnchorKind::Inclusive, group).unwrap();

        tracker.prefer(&target);
        doc.borrow_mut().replace(2, 1, "XY").unwrap();
        assert_eq!(empty.range(), 2..2);
        assert_eq!(target.range(), 2..4);
        assert_eq!(tail.range(), 4..5);
    }

    #[test]
    fn groups_are_adjusted_independently() {
        let (tracker, doc, id) = setup("abcdef");
        let outer = tracker
            .anchor(id, 0..6, AnchorKind::Inclusive, tracker.new_group())
            .unwrap();
        let inner = tracker.new_group();
        let first = tracker.anchor(id, 0..3, AnchorKind::Inclusive, inner).unwrap();
        let second = tracker.anchor(id, 3..6, AnchorKind::Inclusive, inner).unwrap();

        doc.borrow_mut().insert(3, "-").unwrap();
        assert_eq!(outer.range(), 0..7);
        assert_eq!(first.range(), 0..3);
        assert_eq!(second.range(), 3..7);
    }

    #[test]
    fn region_span_shifts_at_start_and_ignores_end() {
        let (tracker, doc, id) = setup("0123456789");
        let region = tracker
            .anchor(id, 2..6, AnchorKind::Region, tracker.new_group())
            .unwrap();

        doc.borrow_mut().insert(2, "ab").unwrap();
        assert_eq!(region.range(), 4..8);
        doc.borrow_mut().insert(8, "c").unwrap();
        assert_eq!(region.range(), 4..8);
        doc.borrow_mut().insert(5, "d").unwrap();
        assert_eq!(region.range(), 4..9);
    }

    #[test]
    fn region_keeps_replaced_text_at_its_edges() {
        let (tracker, doc, id) = setup("..abcd..");
        let region = tracker
            .anchor(id, 2..6, AnchorKind::Region, tracker.new_group())
            .unwrap();

        doc.borrow_mut().replace(2, 2, "XYZ").unwrap();
        assert_eq!(region.range(), 2..7);
        doc.borrow_mut().replace(5, 2, "Q").unwrap();
        assert_eq!(region.range(), 2..6);
        assert_eq!(&doc.borrow().text()[region.range()], "XYZQ");
        // A replacement right after the region stays outside.
        doc.borrow_mut().replace(6, 1, "-").unwrap();
        assert_eq!(region.range(), 2..6);
    }

    #[test]
    fn deletion_empties_but_keeps_spans() {
        let (tracker, doc, id) = setup("aaaa\nbbbb\ncccc\n");
        let group = tracker.new_group();
        let span = tracker.anchor(id, 5..10, AnchorKind::Inclusive, group).unwrap();
        let after = tracker.anchor(id, 10..15, AnchorKind::Inclusive, group).unwrap();

        doc.borrow_mut().delete(3, 9).unwrap();
        assert_eq!(span.range(), 3..3);
        assert_eq!(after.range(), 3..6);
        assert!(!span.is_released());
        assert_eq!(tracker.span_count(id).unwrap(), 2);
    }

    #[test]
    fn replacement_is_delete_then_insert() {
        let (tracker, doc, id) = setup("abcdefgh");
        let group = tracker.new_group();
        let span = tracker.anchor(id, 2..6, AnchorKind::Inclusive, group).unwrap();
        doc.borrow_mut().replace(4, 4, "XY").unwrap();
        assert_eq!(span.range(), 2..6);
        assert_eq!(&doc.borrow().text()[span.range()], "cdXY");
    }

    #[test]
    fn edits_outside_a_span_keep_its_text() {
        let (tracker, doc, id) = setup("one\ntwo\nthree\n");
        let group = tracker.new_group();
        let span = tracker.anchor(id, 4..7, AnchorKind::Inclusive, group).unwrap();
        doc.borrow_mut().insert(0, "zero\n").unwrap();
        let len = doc.borrow().len();
        doc.borrow_mut().insert(len, "four\n").unwrap();
        doc.borrow_mut().delete(14, 2).unwrap();
        assert_eq!(&doc.borrow().text()[span.range()], "two");
    }

    #[test]
    fn released_spans_stop_moving() {
        let (tracker, doc, id) = setup("abcdef");
        let group = tracker.new_group();
        let span = tracker.anchor(id, 3..4, AnchorKind::Inclusive, group).unwrap();
        tracker.release_group(group);
        doc.borrow_mut().insert(0, "xx").unwrap();
        assert!(span.is_released());
        assert_eq!(span.range(), 3..4);
        assert_eq!(tracker.span_count(id).unwrap(), 0);
    }

    #[test]
    fn unregistered_document_is_an_invalid_anchor() {
        let tracker = PositionTracker::new();
        let stray = DocumentId::new();
        let group = tracker.new_group();
        assert_eq!(
            tracker.anchor(stray, 0..0, AnchorKind::Inclusive, group).unwrap_err(),
            EngineError::InvalidAnchor(stray)
        );
        assert!(tracker.spans_at(stray, 0).is_err());
    }

    #[test]
    fn anchor_must_fit_the_document() {
        let (tracker, _doc, id) = setup("abc");
        let group = tracker.new_group();
        assert!(matches!(
            tracker.anchor(id, 2..5, AnchorKind::Inclusive, group),
            Err(EngineError::InvalidRange { .. })
        ));
    }

    #[test]
    fn unregister_releases_spans() {
        let (tracker, doc, id) = setup("abc");
        let span = tracker
            .anchor(id, 0..1, AnchorKind::Inclusive, tracker.new_group())
            .unwrap();
        tracker.unregister(id);
        assert!(span.is_released());
        assert!(!tracker.is_registered(id));
        doc.borrow_mut().insert(0, "x").unwrap();
        assert_eq!(span.range(), 0..1);
        assert_eq!(doc.borrow().listener_count(), 0);
    }
}

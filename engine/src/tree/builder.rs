//! Conversion of difference records into anchored nodes.

use std::rc::Rc;

use tracing::debug;

use super::Diff;
use crate::comparator::RangeComparator;
use crate::contributor::Contributor;
use crate::diff::RangeDifference;
use crate::document::DocumentId;
use crate::error::EngineError;
use crate::position::{AnchorKind, PositionTracker, SpanGroup};

/// One contributor's side of a build.
pub struct TreeInput<'a> {
    /// Document the spans are anchored in.
    pub document: DocumentId,
    /// The elements the records index into.
    pub comparator: &'a dyn RangeComparator,
    /// Byte offset in the document where the compared text starts.
    pub base_offset: usize,
}

/// Anchors every record in its documents.
///
/// Element ranges become byte spans in `group`. With `line_heights` a node's
/// height on a contributor is its element count there; token-level nodes
/// carry no height.
///
/// # Errors
///
/// Returns `InvalidAnchor` if a document is not registered with `tracker`.
pub fn build_diff_tree(
    records: &[RangeDifference],
    inputs: &[Option<TreeInput<'_>>; 3],
    tracker: &PositionTracker,
    group: SpanGroup,
    line_heights: bool,
) -> Result<Vec<Rc<Diff>>, EngineError> {
    let mut diffs = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let mut spans = [None, None, None];
        let mut heights = [0; 3];
        let kind = if record.is_change() {
            AnchorKind::Change
        } else {
            AnchorKind::Inclusive
        };
        for contributor in Contributor::ALL {
            let input = &inputs[contributor.index()];
            let (Some(input), Some(range)) = (input, record.range(contributor)) else {
                continue;
            };
            let bytes = input.comparator.text_range(range.clone());
            let span = tracker.anchor(
                input.document,
                input.base_offset + bytes.start..input.base_offset + bytes.end,
                kind,
                group,
            )?;
            spans[contributor.index()] = Some(span);
            if line_heights {
                heights[contributor.index()] = range.len();
            }
        }
        diffs.push(Rc::new(Diff::new(index, record, spans, heights)));
    }
    debug!(%group, nodes = diffs.len(), "built diff tree");
    Ok(diffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::LineComparator;
    use crate::diff::{DiffLimits, DifferenceKind, MyersDiff, diff_two_way};
    use crate::document::Document;

    #[test]
    fn spans_cover_record_lines() {
        let tracker = PositionTracker::new();
        let left = Document::shared("head\na\nb\nc\n");
        let right = Document::shared("a\nx\nc\n");
        tracker.register(&left);
        tracker.register(&right);

        // Left is compared from its second line on.
        let (l, r) = (
            LineComparator::new("a\nb\nc\n", false),
            LineComparator::new("a\nx\nc\n", false),
        );
        let records = diff_two_way(&l, &r, &MyersDiff::new(), &DiffLimits::default()).unwrap();
        let inputs = [
            None,
            Some(TreeInput {
                document: left.borrow().id(),
                comparator: &l,
                base_offset: 5,
            }),
            Some(TreeInput {
                document: right.borrow().id(),
                comparator: &r,
                base_offset: 0,
            }),
        ];
        let group = tracker.new_group();
        let diffs = build_diff_tree(&records, &inputs, &tracker, group, true).unwrap();

        assert_eq!(diffs.len(), 3);
        let change = &diffs[1];
        assert_eq!(change.kind(), DifferenceKind::RightChanged);
        assert_eq!(change.span(Contributor::Left).unwrap().range(), 7..9);
        assert_eq!(change.span(Contributor::Right).unwrap().range(), 2..4);
        assert!(change.span(Contributor::Ancestor).is_none());
        assert_eq!(change.left_height(), 1);
        assert_eq!(change.max_height(), 1);
        assert_eq!(diffs[2].span(Contributor::Left).unwrap().range(), 9..11);
    }

    #[test]
    fn unregistered_document_fails() {
        let tracker = PositionTracker::new();
        let l = LineComparator::new("a\n", false);
        let records = vec![RangeDifference::two_way(DifferenceKind::NoChange, 0..1, 0..1)];
        let stray = DocumentId::new();
        let input = || {
            Some(TreeInput {
                document: stray,
                comparator: &l,
                base_offset: 0,
            })
        };
        let group = tracker.new_group();
        let result = build_diff_tree(&records, &[None, input(), input()], &tracker, group, true);
        assert_eq!(result.unwrap_err(), EngineError::InvalidAnchor(stray));
    }
}

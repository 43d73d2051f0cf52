//! Full recompute and lazy token refinement.

use std::ops::Range;
use std::rc::Rc;

use tracing::{debug, info, instrument, warn};

use super::{DocumentMerger, MergeEvent, MergeHost, MergeState};
use crate::comparator::{LineComparator, RangeComparator};
use crate::contributor::Contributor;
use crate::diff::{RangeDifference, diff_three_way, diff_two_way};
use crate::document::DocumentId;
use crate::error::EngineError;
use crate::tree::{Diff, DiffSequence, TreeInput, build_diff_tree};

/// The compared text of one contributor, copied out of its document.
struct Snapshot {
    document: DocumentId,
    range: Range<usize>,
    first_line: usize,
    text: String,
}

impl<H: MergeHost> DocumentMerger<H> {
    /// Rebuilds the diff sequence from the current document contents.
    ///
    /// The previous sequence is replaced wholesale and its spans released.
    /// The host receives `SequenceReplaced` on success and
    /// `ComplexityExceeded` when the diff gives up.
    ///
    /// # Errors
    ///
    /// Returns `NotBound` before [`bind`](Self::bind), `ComplexityExceeded`
    /// when the diff budget is exhausted (the merger is then in `Error` with
    /// no sequence), and `InvalidRange` if a working region no longer fits
    /// its document.
    #[instrument(skip(self), fields(generation = self.generation()))]
    pub fn recompute(&mut self) -> Result<&DiffSequence, EngineError> {
        if self.state == MergeState::Empty {
            return Err(EngineError::NotBound);
        }
        self.config = self.host.config();
        let generation = self.generation();
        let three_way = self.is_three_way();

        let mut snapshots: [Option<Snapshot>; 3] = [None, None, None];
        for contributor in Contributor::ALL {
            if contributor == Contributor::Ancestor && !three_way {
                continue;
            }
            if let Some(binding) = self.binding(contributor) {
                let range = binding.region_range();
                let document = binding.document.borrow();
                snapshots[contributor.index()] = Some(Snapshot {
                    document: binding.id,
                    first_line: document.line_of_offset(range.start),
                    text: document.slice(range.clone())?.to_string(),
                    range,
                });
            }
        }

        let ignore_whitespace = self.config.settings.ignore_whitespace;
        let comparators = snapshots
            .each_ref()
            .map(|s| s.as_ref().map(|s| LineComparator::new(&s.text, ignore_whitespace)));
        let algorithm = Rc::clone(&self.config.diff_algorithm);
        let limits = self.config.settings.limits();

        let result = match &comparators {
            [Some(ancestor), Some(left), Some(right)] => {
                diff_three_way(ancestor, left, right, &*algorithm, &limits)
            }
            [None, Some(left), Some(right)] => {
                diff_two_way(left, right, &*algorithm, &limits)
            }
            _ => return Err(EngineError::NotBound),
        };

        let records = match result {
            Ok(records) => records,
            Err(EngineError::ComplexityExceeded(reason)) => {
                self.replace_sequence(None);
                self.computed_at = generation;
                self.transition(MergeState::Error)?;
                warn!(%reason, "diff unavailable");
                self.host
                    .notify(&MergeEvent::ComplexityExceeded { reason });
                return Err(EngineError::ComplexityExceeded(reason));
            }
            Err(err) => return Err(err),
        };

        let inputs = [0, 1, 2].map(|i| {
            let snapshot = snapshots[i].as_ref()?;
            let comparator = comparators[i].as_ref()?;
            Some(TreeInput {
                document: snapshot.document,
                comparator: comparator as &dyn RangeComparator,
                base_offset: snapshot.range.start,
            })
        });
        let group = self.tracker.new_group();
        let diffs = match build_diff_tree(&records, &inputs, &self.tracker, group, true) {
            Ok(diffs) => diffs,
            Err(err) => {
                self.tracker.release_group(group);
                return Err(err);
            }
        };
        let first_lines = [0, 1, 2].map(|i| snapshots[i].as_ref().map_or(0, |s| s.first_line));
        let sequence = DiffSequence::new(diffs, generation, group, first_lines);

        let show_pseudo = self.config.settings.show_pseudo_conflicts;
        let changes = sequence
            .diffs()
            .iter()
            .filter(|d| d.is_navigable(show_pseudo))
            .count();

        self.replace_sequence(None);
        self.computed_at = generation;
        self.transition(MergeState::Clean)?;
        info!(
            three_way,
            diffs = sequence.len(),
            changes,
            "recomputed diff sequence"
        );
        self.host.notify(&MergeEvent::SequenceReplaced {
            generation,
            changes,
        });
        let sequence: &DiffSequence = self.sequence.insert(sequence);
        Ok(sequence)
    }

    /// Token-level children of `diff`, computed on first access from the
    /// current text of its spans and cached on the node.
    ///
    /// `NoChange` nodes, nodes of a replaced sequence and nodes whose
    /// refinement exceeds the diff budget have no children.
    pub fn children<'d>(&self, diff: &'d Diff) -> &'d [Rc<Diff>] {
        diff.children_or_init(|| self.refine(diff))
    }

    fn refine(&self, diff: &Diff) -> Vec<Rc<Diff>> {
        let mut texts: [Option<(DocumentId, usize, String)>; 3] = [None, None, None];
        for contributor in diff.contributors() {
            let Some(span) = diff.span(contributor) else {
                continue;
            };
            if span.is_released() {
                return Vec::new();
            }
            let Some(binding) = self.binding(contributor) else {
                return Vec::new();
            };
            let document = binding.document.borrow();
            match document.slice(span.range()) {
                Ok(text) => {
                    texts[contributor.index()] =
                        Some((span.document(), span.offset(), text.to_string()));
                }
                Err(err) => {
                    warn!(%err, index = diff.index(), "cannot read diff text");
                    return Vec::new();
                }
            }
        }

        let factory = &self.config.token_comparator_factory;
        let ignore_whitespace = self.config.settings.ignore_whitespace;
        let comparators = texts
            .each_ref()
            .map(|t| t.as_ref().map(|(_, _, text)| factory(text, ignore_whitespace)));
        let algorithm = &*self.config.diff_algorithm;
        let limits = self.config.settings.limits();

        let result = match &comparators {
            [Some(ancestor), Some(left), Some(right)] => diff_three_way(
                &**ancestor,
                &**left,
                &**right,
                algorithm,
                &limits,
            ),
            [_, Some(left), Some(right)] => {
                diff_two_way(&**left, &**right, algorithm, &limits)
            }
            _ => return Vec::new(),
        };
        let records: Vec<RangeDifference> = match result {
            Ok(records) => records.into_iter().filter(RangeDifference::is_change).collect(),
            Err(err) => {
                warn!(%err, index = diff.index(), "token refinement failed");
                return Vec::new();
            }
        };

        let inputs = [0, 1, 2].map(|i| {
            let (document, offset, _) = texts[i].as_ref()?;
            let comparator = comparators[i].as_ref()?;
            Some(TreeInput {
                document: *document,
                comparator: &**comparator,
                base_offset: *offset,
            })
        });
        let group = self.tracker.new_group();
        match build_diff_tree(&records, &inputs, &self.tracker, group, false) {
            Ok(children) => {
                if let Some(sequence) = &self.sequence {
                    sequence.adopt_group(group);
                }
                debug!(index = diff.index(), children = children.len(), "refined diff");
                children
            }
            Err(err) => {
                self.tracker.release_group(group);
                warn!(%err, index = diff.index(), "token refinement failed");
                Vec::new()
            }
        }
    }
}

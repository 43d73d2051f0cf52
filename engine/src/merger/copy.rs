//! Merge copy between the left and right documents.

use tracing::{debug, instrument};

use super::{DocumentMerger, MergeEvent, MergeHost};
use crate::contributor::Contributor;
use crate::error::EngineError;
use crate::tree::Diff;

impl<H: MergeHost> DocumentMerger<H> {
    /// Replaces the destination side of `diff` with the text of its source
    /// side.
    ///
    /// The destination span ends up covering exactly the copied text. The
    /// node is marked resolved (three-way only) and the host receives
    /// `DiffResolved`. The sequence is not recomputed; the merger reads as
    /// dirty afterwards.
    ///
    /// Returns `false` when there was nothing to copy: a side is missing,
    /// the node belongs to a replaced sequence, or both sides already hold
    /// the same text.
    ///
    /// # Errors
    ///
    /// Returns `NotBound` if a side's document is no longer bound and
    /// `InvalidRange` if a span no longer fits its document.
    #[instrument(skip(self, diff), fields(index = diff.index()))]
    pub fn copy(&mut self, diff: &Diff, left_to_right: bool) -> Result<bool, EngineError> {
        let (from, to) = Contributor::copy_direction(left_to_right);
        let (Some(source), Some(target)) = (diff.span(from), diff.span(to)) else {
            return Ok(false);
        };
        if source.is_released() || target.is_released() {
            return Ok(false);
        }
        let (Some(src), Some(dst)) = (self.binding(from), self.binding(to)) else {
            return Err(EngineError::NotBound);
        };

        let text = src.document.borrow().slice(source.range())?.to_string();
        {
            let current = dst.document.borrow();
            if current.slice(target.range())? == text {
                return Ok(false);
            }
        }
        let target_range = target.range();
        // Peers may share the destination's offset once its text is removed.
        self.tracker.prefer(target);
        dst.document
            .borrow_mut()
            .replace(target_range.start, target_range.len(), &text)?;

        diff.set_resolved(true);
        debug!(%from, %to, bytes = text.len(), "copied diff");
        self.host.notify(&MergeEvent::DiffResolved {
            index: diff.index(),
        });
        Ok(true)
    }

    /// Copies every change in one direction, last to first. Returns the
    /// number of nodes that changed the destination.
    ///
    /// # Errors
    ///
    /// Stops at the first failing copy and returns its error.
    #[instrument(skip(self))]
    pub fn copy_all(&mut self, left_to_right: bool) -> Result<usize, EngineError> {
        let changes: Vec<_> = self
            .all_ranges()
            .iter()
            .filter(|d| d.is_change())
            .cloned()
            .collect();
        let mut copied = 0;
        for diff in changes.iter().rev() {
            if self.copy(diff, left_to_right)? {
                copied += 1;
            }
        }
        debug!(copied, "copied all changes");
        Ok(copied)
    }
}

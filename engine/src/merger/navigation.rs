//! Lookup, navigation and layout queries against the last sequence.
//!
//! Queries never recompute. Without a sequence they find nothing and the
//! line mapping is the identity.

use std::rc::Rc;

use tracing::{error, warn};

use super::{DocumentMerger, MergeHost};
use crate::contributor::Contributor;
use crate::diff::DifferenceKind;
use crate::error::EngineError;
use crate::tree::{Diff, DiffSequence};

impl<H: MergeHost> DocumentMerger<H> {
    /// Every node of the sequence, `NoChange` included.
    #[must_use]
    pub fn all_ranges(&self) -> &[Rc<Diff>] {
        self.sequence
            .as_ref()
            .map(DiffSequence::diffs)
            .unwrap_or_default()
    }

    /// The changes navigation stops on. Pseudo-conflicts are left out unless
    /// `show_pseudo_conflicts` is set.
    #[must_use]
    pub fn changes(&self) -> Vec<Rc<Diff>> {
        self.navigable().cloned().collect()
    }

    /// Number of navigable changes.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.navigable().count()
    }

    /// Number of navigable changes no merge copy has resolved.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.navigable().filter(|d| !d.is_resolved()).count()
    }

    /// Whether a three-way conflict is still unresolved.
    #[must_use]
    pub fn has_unresolved_conflicts(&self) -> bool {
        self.navigable()
            .any(|d| d.kind() == DifferenceKind::Conflict && !d.is_resolved())
    }

    /// The change whose span on `contributor` contains `offset`.
    #[must_use]
    pub fn find_diff(&self, contributor: Contributor, offset: usize) -> Option<Rc<Diff>> {
        self.navigable()
            .find(|d| d.span(contributor).is_some_and(|s| s.contains(offset)))
            .cloned()
    }

    /// Changes whose span on `contributor` intersects `start..end`.
    #[must_use]
    pub fn find_diff_in_range(
        &self,
        contributor: Contributor,
        start: usize,
        end: usize,
    ) -> Vec<Rc<Diff>> {
        let range = start..end;
        self.navigable()
            .filter(|d| d.span(contributor).is_some_and(|s| s.intersects(&range)))
            .cloned()
            .collect()
    }

    /// The first change on `contributor` starting after `pos`. With `deep`,
    /// token-level children are visited inside each change.
    #[must_use]
    pub fn find_next(&self, contributor: Contributor, pos: usize, deep: bool) -> Option<Rc<Diff>> {
        for diff in self.navigable() {
            let Some(span) = diff.span(contributor) else {
                continue;
            };
            if deep && span.end() > pos {
                let children = self.children(diff);
                let next = children
                    .iter()
                    .find(|c| c.span(contributor).is_some_and(|s| s.offset() > pos));
                if let Some(child) = next {
                    return Some(child.clone());
                }
                if !children.is_empty() {
                    continue;
                }
            }
            if span.offset() > pos {
                return Some(diff.clone());
            }
        }
        None
    }

    /// The last change on `contributor` ending at or before `pos`. With
    /// `deep`, token-level children are visited inside each change.
    #[must_use]
    pub fn find_prev(&self, contributor: Contributor, pos: usize, deep: bool) -> Option<Rc<Diff>> {
        let before = |d: &Rc<Diff>| {
            d.span(contributor)
                .is_some_and(|s| s.end() <= pos && s.offset() < pos)
        };
        let changes = self.changes();
        for diff in changes.iter().rev() {
            let Some(span) = diff.span(contributor) else {
                continue;
            };
            if deep && span.offset() < pos {
                let children = self.children(diff);
                if let Some(child) = children.iter().rev().find(|c| before(*c)) {
                    return Some(child.clone());
                }
                if !children.is_empty() {
                    continue;
                }
            }
            if before(diff) {
                return Some(diff.clone());
            }
        }
        None
    }

    /// Total virtual height: the sum of every block's tallest side.
    #[must_use]
    pub fn virtual_height(&self) -> usize {
        self.sequence
            .as_ref()
            .map_or(0, |s| s.height_index().virtual_height())
    }

    /// Virtual line of document line `line` on `contributor`.
    #[must_use]
    pub fn to_virtual(&self, contributor: Contributor, line: usize) -> usize {
        let Some(sequence) = &self.sequence else {
            return line;
        };
        let first = sequence.first_line(contributor);
        sequence
            .height_index()
            .to_virtual(contributor, line.saturating_sub(first))
    }

    /// Document line on `contributor` shown at virtual line `v`.
    #[must_use]
    pub fn to_real(&self, contributor: Contributor, v: usize) -> usize {
        let Some(sequence) = &self.sequence else {
            return v;
        };
        sequence.first_line(contributor) + sequence.height_index().to_real(contributor, v)
    }

    /// The node whose block covers virtual line `v`.
    #[must_use]
    pub fn diff_at_virtual_line(&self, v: usize) -> Option<Rc<Diff>> {
        let sequence = self.sequence.as_ref()?;
        let block = sequence.height_index().block_at_virtual(v)?;
        sequence.get(block).cloned()
    }

    /// Checks that the sequence is still ordered on every contributor and
    /// recomputes if it is not.
    ///
    /// # Errors
    ///
    /// Returns the recompute error when the forced recompute fails.
    pub fn ensure_consistent(&mut self) -> Result<(), EngineError> {
        let Some(sequence) = &self.sequence else {
            return Ok(());
        };
        let order = sequence.check_order();
        debug_assert!(order.is_ok(), "diff sequence out of order: {order:?}");
        match order {
            Ok(()) => Ok(()),
            Err(violation) => self.rebuild_after(&violation),
        }
    }

    /// Replaces a sequence found out of order with a fresh one.
    fn rebuild_after(&mut self, violation: &EngineError) -> Result<(), EngineError> {
        error!(err = %violation, "diff sequence out of order, recomputing");
        if let Err(err) = self.recompute() {
            warn!(%err, "forced recompute failed");
            return Err(err);
        }
        Ok(())
    }

    fn navigable(&self) -> impl Iterator<Item = &Rc<Diff>> {
        let show_pseudo = self.config.settings.show_pseudo_conflicts;
        self.all_ranges()
            .iter()
            .filter(move |d| d.is_navigable(show_pseudo))
    }
}

//! Merger state machine - lifecycle states and transition validation.

use serde::Serialize;
use tracing::debug;

use super::{DocumentMerger, MergeHost};
use crate::error::EngineError;

/// Lifecycle state of a [`DocumentMerger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MergeState {
    /// Nothing bound.
    Empty,
    /// Bound, but the sequence is missing or older than the documents.
    Dirty,
    /// The sequence matches the documents.
    Clean,
    /// The last recompute failed; there is no sequence.
    Error,
}

impl MergeState {
    /// Validates a transition from `self` to `to`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the merger cannot move from `self`
    /// to `to`.
    pub fn validate_transition(self, to: Self) -> Result<(), EngineError> {
        let valid = match (self, to) {
            // Anything can be released
            (_, Self::Empty) => true,
            // Binding
            (Self::Empty, Self::Dirty) => true,
            // Recompute, forced or not
            (Self::Dirty | Self::Clean | Self::Error, Self::Clean | Self::Error) => true,
            // Edits and region changes
            (Self::Dirty | Self::Clean | Self::Error, Self::Dirty) => true,
            // Nothing to compute before binding
            (Self::Empty, Self::Clean | Self::Error) => false,
        };

        if valid {
            Ok(())
        } else {
            Err(EngineError::InvalidStateTransition { from: self, to })
        }
    }
}

impl<H: MergeHost> DocumentMerger<H> {
    /// The current state. A clean or failed merger reads as `Dirty` as soon
    /// as a bound document is edited.
    #[must_use]
    pub fn state(&self) -> MergeState {
        match self.state {
            MergeState::Clean | MergeState::Error if self.generation() != self.computed_at => {
                MergeState::Dirty
            }
            state => state,
        }
    }

    /// Whether the sequence is missing or older than the documents.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state() == MergeState::Dirty
    }

    /// Moves to `to` after validating the transition.
    pub(super) fn transition(&mut self, to: MergeState) -> Result<(), EngineError> {
        let from = self.state();
        from.validate_transition(to)?;
        self.state = to;
        debug!(?from, ?to, "merger state changed");
        Ok(())
    }
}

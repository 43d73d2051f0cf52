//! Engine errors.
//!
//! `ComplexityExceeded` is the only condition a user ever sees ("diff
//! unavailable"). `InvalidAnchor` and `InvariantViolation` point at
//! integration or engine defects and are logged rather than surfaced.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::contributor::Contributor;
use crate::document::DocumentId;
use crate::merger::MergeState;

/// The budget a diff run exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComplexityLimit {
    /// The shortest edit script is longer than the allowed edit distance.
    EditDistance(usize),
    /// The run took longer than the allowed wall-clock time.
    Timeout(Duration),
}

impl fmt::Display for ComplexityLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EditDistance(max) => write!(f, "edit distance exceeds {max}"),
            Self::Timeout(limit) => write!(f, "diff did not finish within {limit:?}"),
        }
    }
}

/// Errors raised by the merge engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The diff algorithm gave up on pathological input.
    #[error("Diff unavailable: {0}")]
    ComplexityExceeded(ComplexityLimit),

    /// A span was requested on a document never registered with the tracker.
    #[error("Document {0} is not registered with the position tracker")]
    InvalidAnchor(DocumentId),

    /// Two diffs are out of order on a contributor.
    #[error("Diff sequence out of order on {contributor} at diff {index}")]
    InvariantViolation {
        /// Contributor whose spans overlap.
        contributor: Contributor,
        /// Index of the first diff that starts before its predecessor ends.
        index: usize,
    },

    /// An edit or span does not fit the document.
    #[error("Range {offset}+{len} is invalid for a document of {doc_len} bytes")]
    InvalidRange {
        /// Start offset in bytes.
        offset: usize,
        /// Length in bytes.
        len: usize,
        /// Current document length in bytes.
        doc_len: usize,
    },

    /// The operation needs bound documents.
    #[error("No documents are bound to the merger")]
    NotBound,

    /// The merger cannot move between these states.
    #[error("Invalid merger state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        /// Current state.
        from: MergeState,
        /// Requested state.
        to: MergeState,
    },
}

impl EngineError {
    /// Whether the error should be shown to the user as "diff unavailable".
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(self, Self::ComplexityExceeded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_complexity_is_user_facing() {
        assert!(EngineError::ComplexityExceeded(ComplexityLimit::EditDistance(10)).is_user_facing());
        assert!(!EngineError::NotBound.is_user_facing());
        assert!(
            !EngineError::InvariantViolation {
                contributor: Contributor::Left,
                index: 3,
            }
            .is_user_facing()
        );
    }

    #[test]
    fn messages_name_the_limit() {
        let err = EngineError::ComplexityExceeded(ComplexityLimit::EditDistance(42));
        assert_eq!(err.to_string(), "Diff unavailable: edit distance exceeds 42");
    }
}

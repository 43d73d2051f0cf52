//! Notifications sent to the host.

use serde::Serialize;

use crate::error::ComplexityLimit;

/// Events the merger reports through [`MergeHost::notify`](super::MergeHost::notify).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MergeEvent {
    /// A recompute produced a new sequence. Highlighting and navigation
    /// state built on the old one is stale.
    SequenceReplaced {
        /// Edit generation the sequence was computed at.
        generation: u64,
        /// Number of navigable changes in the new sequence.
        changes: usize,
    },

    /// A merge copy settled a difference.
    DiffResolved {
        /// Index of the node in its sequence.
        index: usize,
    },

    /// The diff gave up; the views should show "diff unavailable".
    ComplexityExceeded {
        /// The exhausted budget.
        reason: ComplexityLimit,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_variant_name() {
        let value = serde_json::to_value(MergeEvent::DiffResolved { index: 3 }).unwrap();
        assert_eq!(value, serde_json::json!({ "DiffResolved": { "index": 3 } }));

        let value = serde_json::to_value(MergeEvent::ComplexityExceeded {
            reason: ComplexityLimit::EditDistance(10),
        })
        .unwrap();
        assert_eq!(value["ComplexityExceeded"]["reason"]["EditDistance"], 10);
    }
}

//! Mergeview Engine
//!
//! Differencing and synchronization core of a side-by-side compare/merge
//! view. Given up to three related documents (ancestor, left, right) it:
//! 1. Computes an ordered sequence of line-level differences, two- or
//!    three-way, and refines single differences to tokens on demand
//! 2. Keeps every difference anchored while the documents are edited
//! 3. Navigates, resolves and merge-copies differences
//! 4. Maps lines into a shared virtual space so the views scroll together
//!
//! The host application supplies documents and configuration through
//! [`MergeHost`] and drives [`DocumentMerger`]. Everything runs on one
//! thread.
//!
//! # Example
//!
//! ```
//! use std::ops::Range;
//!
//! use mergeview_engine::{
//!     Contributor, Document, DocumentMerger, MergeConfig, MergeEvent, MergeHost,
//!     SharedDocument,
//! };
//!
//! struct Host {
//!     left: SharedDocument,
//!     right: SharedDocument,
//! }
//!
//! impl MergeHost for Host {
//!     fn document(&self, contributor: Contributor) -> Option<SharedDocument> {
//!         match contributor {
//!             Contributor::Left => Some(self.left.clone()),
//!             Contributor::Right => Some(self.right.clone()),
//!             Contributor::Ancestor => None,
//!         }
//!     }
//!
//!     fn working_region(&self, _contributor: Contributor) -> Option<Range<usize>> {
//!         None
//!     }
//!
//!     fn config(&self) -> MergeConfig {
//!         MergeConfig::default()
//!     }
//!
//!     fn notify(&self, _event: &MergeEvent) {}
//! }
//!
//! let host = Host {
//!     left: Document::shared("a\nb\nc"),
//!     right: Document::shared("a\nx\nc"),
//! };
//! let mut merger = DocumentMerger::new(host);
//! merger.bind()?;
//! merger.recompute()?;
//! assert_eq!(merger.change_count(), 1);
//! # Ok::<(), mergeview_engine::EngineError>(())
//! ```

pub mod comparator;
pub mod config;
pub mod contributor;
pub mod diff;
pub mod document;
pub mod error;
pub mod merger;
pub mod position;
pub mod scroll;
pub mod telemetry;
pub mod tree;

pub use crate::config::{MergeConfig, MergeSettings};
pub use contributor::Contributor;
pub use diff::{DiffLimits, DifferenceKind, RangeDifference};
pub use document::{Document, DocumentId, EditEvent, EditListener, SharedDocument};
pub use error::{ComplexityLimit, EngineError};
pub use merger::{DocumentMerger, MergeEvent, MergeHost, MergeState};
pub use position::{AnchorKind, PositionTracker, Span};
pub use scroll::{ScrollSynchronizer, Viewport};
pub use tree::{Diff, DiffSequence};

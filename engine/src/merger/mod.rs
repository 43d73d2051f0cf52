//! Merge orchestration.
//!
//! [`DocumentMerger`] binds the host's documents, recomputes the diff
//! sequence on demand and answers navigation, copy and layout queries
//! against the last sequence. The host is reached only through
//! [`MergeHost`].
//!
//! Everything runs on the host's UI thread. Edits made between recomputes
//! only mark the merger dirty; spans keep following the edits but kinds are
//! as of the last recompute.

mod copy;
mod events;
mod navigation;
mod recompute;
mod state;

use std::cell::Cell;
use std::ops::Range;
use std::rc::Rc;

use tracing::{debug, info};

use crate::config::MergeConfig;
use crate::contributor::Contributor;
use crate::document::{DocumentId, EditEvent, EditListener, SharedDocument};
use crate::error::EngineError;
use crate::position::{AnchorKind, PositionTracker, Span};
use crate::tree::DiffSequence;

pub use events::MergeEvent;
pub use state::MergeState;

/// The embedding application, as seen by the merger.
pub trait MergeHost {
    /// The document bound to `contributor`, if any. Two-way comparisons bind
    /// no ancestor.
    fn document(&self, contributor: Contributor) -> Option<SharedDocument>;

    /// The byte range of `contributor`'s document taking part in the
    /// comparison. `None` compares the whole document.
    fn working_region(&self, contributor: Contributor) -> Option<Range<usize>>;

    /// Current configuration. Read on bind and on every recompute.
    fn config(&self) -> MergeConfig;

    /// Receives merger events.
    fn notify(&self, event: &MergeEvent);
}

/// Counts edits to the bound documents.
#[derive(Debug, Default)]
struct EditGeneration(Cell<u64>);

impl EditListener for EditGeneration {
    fn document_changed(&self, _event: &EditEvent) {
        self.0.set(self.0.get() + 1);
    }
}

/// A document bound to one contributor.
#[derive(Debug)]
struct Binding {
    document: SharedDocument,
    id: DocumentId,
    region: Option<Span>,
}

impl Binding {
    fn region_range(&self) -> Range<usize> {
        self.region
            .as_ref()
            .map_or_else(|| 0..self.document.borrow().len(), Span::range)
    }
}

/// Computes and maintains the differences between bound documents.
pub struct DocumentMerger<H: MergeHost> {
    host: H,
    config: MergeConfig,
    tracker: PositionTracker,
    bindings: [Option<Binding>; 3],
    generation: Rc<EditGeneration>,
    state: MergeState,
    computed_at: u64,
    sequence: Option<DiffSequence>,
}

impl<H: MergeHost> std::fmt::Debug for DocumentMerger<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentMerger")
            .field("state", &self.state())
            .field("generation", &self.generation.0.get())
            .field("bindings", &self.bindings)
            .field("diffs", &self.sequence.as_ref().map(DiffSequence::len))
            .finish_non_exhaustive()
    }
}

impl<H: MergeHost> DocumentMerger<H> {
    /// Creates an unbound merger.
    #[must_use]
    pub fn new(host: H) -> Self {
        let config = host.config();
        Self {
            host,
            config,
            tracker: PositionTracker::new(),
            bindings: [None, None, None],
            generation: Rc::new(EditGeneration::default()),
            state: MergeState::Empty,
            computed_at: 0,
            sequence: None,
        }
    }

    /// The host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The configuration read at the last bind or recompute.
    #[must_use]
    pub const fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// The position tracker holding this merger's spans.
    #[must_use]
    pub const fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    /// Number of edits seen on bound documents since binding.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.0.get()
    }

    /// The last computed sequence, if any.
    #[must_use]
    pub const fn sequence(&self) -> Option<&DiffSequence> {
        self.sequence.as_ref()
    }

    /// Whether `contributor` has a bound document.
    #[must_use]
    pub fn is_bound(&self, contributor: Contributor) -> bool {
        self.bindings[contributor.index()].is_some()
    }

    /// Whether the next recompute compares three ways.
    #[must_use]
    pub fn is_three_way(&self) -> bool {
        self.is_bound(Contributor::Ancestor) && !self.config.settings.ignore_ancestor
    }

    /// The working region of `contributor`, if one is set.
    #[must_use]
    pub fn working_region(&self, contributor: Contributor) -> Option<&Span> {
        self.bindings[contributor.index()]
            .as_ref()
            .and_then(|b| b.region.as_ref())
    }

    /// Pulls documents and working regions from the host and starts
    /// tracking them. Rebinding releases the previous binding first.
    ///
    /// # Errors
    ///
    /// Returns `NotBound` if the host has no left or right document and
    /// `InvalidRange` if a working region does not fit its document.
    pub fn bind(&mut self) -> Result<(), EngineError> {
        if self.state != MergeState::Empty {
            self.release();
        }
        self.config = self.host.config();
        if self.host.document(Contributor::Left).is_none()
            || self.host.document(Contributor::Right).is_none()
        {
            return Err(EngineError::NotBound);
        }

        let listener: Rc<dyn EditListener> = self.generation.clone();
        for contributor in Contributor::ALL {
            let Some(document) = self.host.document(contributor) else {
                continue;
            };
            let id = document.borrow().id();
            self.tracker.register(&document);
            document.borrow_mut().subscribe(&listener);

            let region = match self.host.working_region(contributor) {
                Some(range) => {
                    let group = self.tracker.new_group();
                    match self.tracker.anchor(id, range, AnchorKind::Region, group) {
                        Ok(span) => Some(span),
                        Err(err) => {
                            self.bindings[contributor.index()] = Some(Binding {
                                document,
                                id,
                                region: None,
                            });
                            self.state = MergeState::Dirty;
                            self.release();
                            return Err(err);
                        }
                    }
                }
                None => None,
            };
            debug!(%contributor, document = %id, has_region = region.is_some(), "bound document");
            self.bindings[contributor.index()] = Some(Binding {
                document,
                id,
                region,
            });
        }

        self.transition(MergeState::Dirty)?;
        info!(three_way = self.is_three_way(), "merger bound");
        Ok(())
    }

    /// Stops restricting `contributor` to a working region; the whole
    /// document is compared from the next recompute on.
    pub fn release_working_region(&mut self, contributor: Contributor) {
        let Some(binding) = self.bindings[contributor.index()].as_mut() else {
            return;
        };
        if let Some(region) = binding.region.take() {
            self.tracker.release(&region);
            debug!(%contributor, "released working region");
            if matches!(self.state(), MergeState::Clean | MergeState::Error) {
                self.state = MergeState::Dirty;
            }
        }
    }

    /// Drops the sequence and every binding. The merger returns to `Empty`
    /// and can be bound again.
    pub fn release(&mut self) {
        self.replace_sequence(None);
        let listener: Rc<dyn EditListener> = self.generation.clone();
        for binding in self.bindings.iter_mut().filter_map(Option::take) {
            binding.document.borrow_mut().unsubscribe(&listener);
            self.tracker.unregister(binding.id);
        }
        self.state = MergeState::Empty;
        debug!("merger released");
    }

    /// Swaps in `next`, releasing the spans of the sequence it replaces.
    fn replace_sequence(&mut self, next: Option<DiffSequence>) {
        if let Some(old) = std::mem::replace(&mut self.sequence, next) {
            for group in old.groups() {
                self.tracker.release_group(group);
            }
        }
    }

    fn binding(&self, contributor: Contributor) -> Option<&Binding> {
        self.bindings[contributor.index()].as_ref()
    }
}

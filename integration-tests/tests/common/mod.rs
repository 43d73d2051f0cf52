//! Shared test utilities for integration tests.
//!
//! Provides an in-memory host that owns the documents, serves settings and
//! records every event the merger sends.

#![allow(dead_code)]

use std::cell::{RefCell, RefMut};
use std::ops::Range;
use std::rc::Rc;

use anyhow::Result;
use mergeview_engine::{
    Contributor, Document, DocumentMerger, MergeConfig, MergeEvent, MergeHost, MergeSettings,
    SharedDocument,
};

struct HostState {
    documents: [Option<SharedDocument>; 3],
    regions: RefCell<[Option<Range<usize>>; 3]>,
    settings: RefCell<MergeSettings>,
    events: RefCell<Vec<MergeEvent>>,
}

/// In-memory host. Clones share state, so a test can keep a handle while
/// the merger owns another.
#[derive(Clone)]
pub struct TestHost(Rc<HostState>);

impl TestHost {
    fn with_documents(documents: [Option<&str>; 3]) -> Self {
        Self(Rc::new(HostState {
            documents: documents.map(|text| text.map(Document::shared)),
            regions: RefCell::new([None, None, None]),
            settings: RefCell::new(MergeSettings::default()),
            events: RefCell::new(Vec::new()),
        }))
    }

    /// A left/right comparison.
    pub fn two_way(left: &str, right: &str) -> Self {
        Self::with_documents([None, Some(left), Some(right)])
    }

    /// An ancestor/left/right comparison.
    pub fn three_way(ancestor: &str, left: &str, right: &str) -> Self {
        Self::with_documents([Some(ancestor), Some(left), Some(right)])
    }

    /// The document bound to `contributor`.
    ///
    /// # Panics
    ///
    /// Panics if the host has no such document.
    pub fn doc(&self, contributor: Contributor) -> SharedDocument {
        self.0.documents[contributor.index()]
            .clone()
            .expect("document bound")
    }

    /// Current text of `contributor`'s document.
    pub fn text(&self, contributor: Contributor) -> String {
        self.doc(contributor).borrow().text().to_string()
    }

    /// Inserts `text` at `offset` in `contributor`'s document.
    pub fn insert(&self, contributor: Contributor, offset: usize, text: &str) -> Result<()> {
        self.doc(contributor).borrow_mut().insert(offset, text)?;
        Ok(())
    }

    /// Restricts `contributor` to `range` from the next bind on.
    pub fn set_region(&self, contributor: Contributor, range: Range<usize>) {
        self.0.regions.borrow_mut()[contributor.index()] = Some(range);
    }

    /// Settings served from now on.
    pub fn settings_mut(&self) -> RefMut<'_, MergeSettings> {
        self.0.settings.borrow_mut()
    }

    /// Every event received so far.
    pub fn events(&self) -> Vec<MergeEvent> {
        self.0.events.borrow().clone()
    }
}

impl MergeHost for TestHost {
    fn document(&self, contributor: Contributor) -> Option<SharedDocument> {
        self.0.documents[contributor.index()].clone()
    }

    fn working_region(&self, contributor: Contributor) -> Option<Range<usize>> {
        self.0.regions.borrow()[contributor.index()].clone()
    }

    fn config(&self) -> MergeConfig {
        MergeConfig::new(self.0.settings.borrow().clone())
    }

    fn notify(&self, event: &MergeEvent) {
        self.0.events.borrow_mut().push(event.clone());
    }
}

/// Binds a merger to `host` and runs the first recompute.
pub fn computed_merger(host: &TestHost) -> Result<DocumentMerger<TestHost>> {
    let mut merger = DocumentMerger::new(host.clone());
    merger.bind()?;
    merger.recompute()?;
    Ok(merger)
}

//! Lockstep scrolling of the compare views.
//!
//! Each view shows one contributor. When one scrolls, its top line is
//! mapped into the shared virtual space and back into every other view's
//! document lines. Setting a view's top line usually makes the widget report
//! a scroll of its own; those nested reports are ignored.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::contributor::Contributor;
use crate::merger::{DocumentMerger, MergeHost};

/// A scrollable text view showing one contributor.
pub trait Viewport {
    /// The contributor the view shows.
    fn contributor(&self) -> Contributor;

    /// Document line at the top of the view.
    fn top_line(&self) -> usize;

    /// Scrolls the view so `line` is at the top.
    fn set_top_line(&self, line: usize);
}

/// Keeps registered viewports vertically aligned.
#[derive(Default)]
pub struct ScrollSynchronizer {
    viewports: Vec<Rc<dyn Viewport>>,
    syncing: Cell<bool>,
}

impl fmt::Debug for ScrollSynchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollSynchronizer")
            .field(
                "viewports",
                &self
                    .viewports
                    .iter()
                    .map(|v| v.contributor())
                    .collect::<Vec<_>>(),
            )
            .field("syncing", &self.syncing.get())
            .finish()
    }
}

/// Clears the re-entrancy flag when the sync pass ends.
struct SyncGuard<'a>(&'a Cell<bool>);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl ScrollSynchronizer {
    /// A synchronizer with no viewports.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a view to keep in step.
    pub fn add_viewport(&mut self, viewport: Rc<dyn Viewport>) {
        self.viewports.push(viewport);
    }

    /// Number of registered views.
    #[must_use]
    pub fn viewport_count(&self) -> usize {
        self.viewports.len()
    }

    /// Whether a sync pass is running.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.syncing.get()
    }

    /// Aligns every other view with `source` after it scrolled.
    ///
    /// Returns `false` without moving anything when called from inside a
    /// running sync pass.
    pub fn viewport_changed<H: MergeHost>(
        &self,
        merger: &DocumentMerger<H>,
        source: &dyn Viewport,
    ) -> bool {
        if self.syncing.replace(true) {
            return false;
        }
        let _guard = SyncGuard(&self.syncing);

        let virtual_line = merger.to_virtual(source.contributor(), source.top_line());
        for viewport in &self.viewports {
            if std::ptr::addr_eq(Rc::as_ptr(viewport), std::ptr::from_ref(source)) {
                continue;
            }
            let line = merger.to_real(viewport.contributor(), virtual_line);
            trace!(
                from = %source.contributor(),
                to = %viewport.contributor(),
                virtual_line,
                line,
                "syncing viewport"
            );
            viewport.set_top_line(line);
        }
        true
    }
}

//! Host-owned text documents and edit notification.
//!
//! The engine never owns document content. It observes edits through the
//! [`EditListener`] interface: the position tracker and the merger's
//! generation counter subscribe once per bound document and are called
//! synchronously, after the text has changed, for every edit.
//!
//! Listeners run while the document is mutably borrowed and must not reach
//! back into it.

use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::{Rc, Weak};

use crate::error::EngineError;

/// Stable identifier for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(uuid::Uuid);

impl DocumentId {
    /// Creates a new unique document ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn inner(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single replacement applied to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditEvent {
    /// The edited document.
    pub document: DocumentId,
    /// Byte offset where the edit starts.
    pub offset: usize,
    /// Number of bytes removed at `offset`.
    pub removed: usize,
    /// Number of bytes inserted at `offset`.
    pub inserted: usize,
}

/// Observer of document edits.
pub trait EditListener {
    /// Called after `event` has been applied to the document text.
    fn document_changed(&self, event: &EditEvent);
}

/// Documents are shared between the host and the engine.
pub type SharedDocument = Rc<RefCell<Document>>;

/// A mutable text buffer with line bookkeeping and edit observers.
pub struct Document {
    id: DocumentId,
    text: String,
    line_starts: Vec<usize>,
    listeners: Vec<Weak<dyn EditListener>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("len", &self.text.len())
            .field("lines", &self.line_starts.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Document {
    /// Creates a document with the given content.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = line_starts(&text);
        Self {
            id: DocumentId::new(),
            text,
            line_starts,
            listeners: Vec::new(),
        }
    }

    /// Creates a document already wrapped for sharing with the engine.
    #[must_use]
    pub fn shared(text: impl Into<String>) -> SharedDocument {
        Rc::new(RefCell::new(Self::new(text)))
    }

    /// The document's identifier.
    #[must_use]
    pub const fn id(&self) -> DocumentId {
        self.id
    }

    /// The full text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the document is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the text in `range`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if the range is out of bounds or splits a
    /// character.
    pub fn slice(&self, range: Range<usize>) -> Result<&str, EngineError> {
        let Some(len) = range.end.checked_sub(range.start) else {
            return Err(EngineError::InvalidRange {
                offset: range.start,
                len: 0,
                doc_len: self.text.len(),
            });
        };
        self.check_range(range.start, len)?;
        Ok(&self.text[range])
    }

    /// Number of lines. An empty document has one line, and a trailing
    /// newline opens a final empty line.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The line containing `offset`. Offsets past the end map to the last
    /// line.
    #[must_use]
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    /// Byte offset where `line` starts.
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Replaces `removed` bytes at `offset` with `text` and notifies
    /// listeners.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if the replaced range is out of bounds or splits
    /// a character.
    pub fn replace(&mut self, offset: usize, removed: usize, text: &str) -> Result<(), EngineError> {
        self.check_range(offset, removed)?;
        self.text.replace_range(offset..offset + removed, text);
        self.line_starts = line_starts(&self.text);

        let event = EditEvent {
            document: self.id,
            offset,
            removed,
            inserted: text.len(),
        };
        self.notify(&event);
        Ok(())
    }

    /// Inserts `text` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `offset` is not a valid position.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(), EngineError> {
        self.replace(offset, 0, text)
    }

    /// Removes `len` bytes at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if the range is invalid.
    pub fn delete(&mut self, offset: usize, len: usize) -> Result<(), EngineError> {
        self.replace(offset, len, "")
    }

    /// Replaces the whole content, e.g. after the host reloaded the file.
    pub fn set_text(&mut self, text: &str) {
        let len = self.text.len();
        // The full range is always valid.
        let _ = self.replace(0, len, text);
    }

    /// Registers a listener. The document keeps only a weak reference.
    pub fn subscribe(&mut self, listener: &Rc<dyn EditListener>) {
        self.listeners.push(Rc::downgrade(listener));
    }

    /// Removes a previously registered listener.
    pub fn unsubscribe(&mut self, listener: &Rc<dyn EditListener>) {
        let target = Rc::downgrade(listener);
        self.listeners.retain(|l| !Weak::ptr_eq(l, &target));
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.iter().filter(|l| l.strong_count() > 0).count()
    }

    fn notify(&mut self, event: &EditEvent) {
        self.listeners.retain(|l| l.strong_count() > 0);
        for listener in &self.listeners {
            if let Some(listener) = listener.upgrade() {
                listener.document_changed(event);
            }
        }
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<(), EngineError> {
        let end = offset.checked_add(len);
        let valid = end.is_some_and(|end| {
            end <= self.text.len()
                && self.text.is_char_boundary(offset)
                && self.text.is_char_boundary(end)
        });
        if valid {
            Ok(())
        } else {
            Err(EngineError::InvalidRange {
                offset,
                len,
                doc_len: self.text.len(),
            })
        }
    }
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

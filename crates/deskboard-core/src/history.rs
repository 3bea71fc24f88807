//! Linear undo/redo over document content.

use crate::document::Document;
use crate::element::Element;
use crate::stroke::Stroke;

/// Default maximum number of history entries to keep.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A snapshot of document content (elements and strokes) for undo/redo.
///
/// Owned deep copy; never aliases the live document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub elements: Vec<Element>,
    pub strokes: Vec<Stroke>,
}

impl DocumentSnapshot {
    pub fn capture(document: &Document) -> Self {
        Self {
            elements: document.elements.clone(),
            strokes: document.strokes.clone(),
        }
    }

    fn restore(self, document: &mut Document) {
        document.elements = self.elements;
        document.strokes = self.strokes;
    }
}

/// Ordered history entries plus a cursor.
///
/// `entries[i]` holds the content as it was immediately before the
/// `i + 1`-th checkpointed mutation. The cursor points at the entry that
/// the next `undo` restores, and is `-1` when there is nothing to undo.
/// When undoing from the newest entry, the live content is appended first
/// so that `redo` can return to it.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<DocumentSnapshot>,
    /// Number of undoable steps (`cursor + 1`).
    position: usize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// Create an empty history keeping at most `limit` undo steps.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            position: 0,
            limit: limit.max(1),
        }
    }

    /// Record the current content. Call immediately before mutating.
    ///
    /// Discards any redoable entries.
    pub fn checkpoint(&mut self, document: &Document) {
        self.entries.truncate(self.position);
        self.entries.push(DocumentSnapshot::capture(document));
        self.position = self.entries.len();

        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
            self.position -= excess;
        }
        log::debug!("checkpoint: {} undo steps", self.position);
    }

    /// Restore the content before the most recent checkpointed mutation.
    /// Returns false if there was nothing to undo.
    pub fn undo(&mut self, document: &mut Document) -> bool {
        if self.position == 0 {
            return false;
        }
        if self.position == self.entries.len() {
            // Keep the live content reachable for redo
            self.entries.push(DocumentSnapshot::capture(document));
        }
        self.position -= 1;
        self.entries[self.position].clone().restore(document);
        true
    }

    /// Re-apply the most recently undone mutation.
    /// Returns false if there was nothing to redo.
    pub fn redo(&mut self, document: &mut Document) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.position += 1;
        self.entries[self.position].clone().restore(document);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position + 1 < self.entries.len()
    }

    /// Cursor index in `[-1, len - 1]`.
    pub fn cursor(&self) -> isize {
        self.position as isize - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = 0;
    }
}

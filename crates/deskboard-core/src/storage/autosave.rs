//! Debounced automatic persistence.
//!
//! The host calls [`AutoSaver::tick`] from its frame or timer loop. Once the
//! editor's revision has been stable for the debounce interval, `tick` hands
//! back a [`PendingSave`] that owns a snapshot of the document, so the
//! editor stays usable while the save is in flight.

use crate::document::Document;
use crate::editor::Editor;
use crate::storage::{Storage, StorageError, StorageResult};
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Default quiet period before an automatic save.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// Key used when the host does not name the document.
pub const DEFAULT_DOCUMENT_KEY: &str = "whiteboard";

/// Persistence state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Storage holds the current document.
    Saved,
    /// There are changes waiting for the debounce or an in-flight save.
    Pending,
    /// The last save attempt failed; it will be retried.
    Unsaved,
}

/// A save that has been started but not yet run.
pub struct PendingSave<S: Storage> {
    storage: Arc<S>,
    key: String,
    revision: u64,
    document: Document,
}

impl<S: Storage> PendingSave<S> {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Write the snapshot to storage.
    pub async fn run(self) -> SaveOutcome {
        let result = self.storage.save(&self.key, &self.document).await;
        SaveOutcome {
            revision: self.revision,
            result,
        }
    }
}

/// Result of a finished [`PendingSave`].
#[derive(Debug)]
pub struct SaveOutcome {
    pub revision: u64,
    pub result: StorageResult<()>,
}

/// Manages debounced saving of one document.
pub struct AutoSaver<S: Storage> {
    storage: Arc<S>,
    key: String,
    debounce: Duration,
    /// Latest editor revision seen.
    seen_revision: u64,
    /// Revision known to be in storage.
    saved_revision: Option<u64>,
    /// When `seen_revision` changed, or when the last attempt failed.
    last_change: Option<Instant>,
    in_flight: Option<u64>,
    failed: bool,
}

impl<S: Storage> AutoSaver<S> {
    /// Create an auto-saver writing to `key`.
    pub fn new(storage: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            debounce: DEFAULT_DEBOUNCE,
            seen_revision: 0,
            saved_revision: None,
            last_change: None,
            in_flight: None,
            failed: false,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Whether the latest seen revision is not yet in storage.
    pub fn is_dirty(&self) -> bool {
        self.saved_revision != Some(self.seen_revision)
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn status(&self) -> SaveStatus {
        if self.failed {
            SaveStatus::Unsaved
        } else if self.is_dirty() {
            SaveStatus::Pending
        } else {
            SaveStatus::Saved
        }
    }

    /// Record that `revision` is what storage holds.
    pub fn mark_saved(&mut self, revision: u64) {
        self.seen_revision = revision;
        self.saved_revision = Some(revision);
        self.last_change = None;
        self.failed = false;
    }

    /// Note the editor's current revision.
    pub fn observe(&mut self, revision: u64, now: Instant) {
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.last_change = Some(now);
        }
    }

    /// Whether a save should start at `now`. A document that was never
    /// saved is due immediately.
    pub fn should_save_at(&self, now: Instant) -> bool {
        if !self.is_dirty() || self.is_saving() {
            return false;
        }
        self.last_change
            .is_none_or(|changed| now.saturating_duration_since(changed) >= self.debounce)
    }

    /// Start saving `document` as `revision`.
    pub fn begin_save(&mut self, revision: u64, document: Document) -> PendingSave<S> {
        self.in_flight = Some(revision);
        PendingSave {
            storage: Arc::clone(&self.storage),
            key: self.key.clone(),
            revision,
            document,
        }
    }

    /// Record the outcome of a save started with [`begin_save`](Self::begin_save).
    ///
    /// Failures are logged and retried after the next debounce interval.
    /// Edits made while the save was running keep the document dirty.
    pub fn finish(&mut self, outcome: SaveOutcome, now: Instant) -> SaveStatus {
        self.in_flight = None;
        match outcome.result {
            Ok(()) => {
                self.saved_revision = Some(outcome.revision);
                self.failed = false;
                log::info!("saved {} (revision {})", self.key, outcome.revision);
            }
            Err(e) => {
                self.failed = true;
                self.last_change = Some(now);
                log::warn!("autosave of {} failed: {e}", self.key);
            }
        }
        self.status()
    }

    /// Observe the editor and start a save if one is due.
    pub fn tick(&mut self, editor: &Editor, now: Instant) -> Option<PendingSave<S>> {
        self.observe(editor.revision(), now);
        if !self.should_save_at(now) {
            return None;
        }
        Some(self.begin_save(editor.revision(), editor.snapshot_for_save()))
    }

    /// Save immediately, ignoring the debounce.
    pub async fn save_now(&mut self, editor: &Editor) -> SaveStatus {
        let now = Instant::now();
        self.observe(editor.revision(), now);
        let pending = self.begin_save(editor.revision(), editor.snapshot_for_save());
        let outcome = pending.run().await;
        self.finish(outcome, Instant::now())
    }

    /// Load the stored document.
    pub async fn load(&self) -> StorageResult<Document> {
        let document = self.storage.load(&self.key).await?;
        log::info!("loaded {} ({} elements, {} strokes)", self.key, document.elements.len(), document.strokes.len());
        Ok(document)
    }

    /// Open the stored document in `editor`, or keep its current document if
    /// nothing is stored. Returns whether a document was loaded.
    pub async fn restore(&mut self, editor: &mut Editor) -> bool {
        match self.load().await {
            Ok(document) => {
                editor.open(document);
                self.mark_saved(editor.revision());
                true
            }
            Err(StorageError::NotFound(_)) => {
                log::info!("no stored document under {}", self.key);
                false
            }
            Err(e) => {
                log::warn!("failed to load {}: {e}", self.key);
                false
            }
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use crate::storage::{BoxFuture, MemoryStorage, block_on};
    use kurbo::Point;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory storage whose writes can be made to fail.
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        failing: AtomicBool,
    }

    impl Storage for FlakyStorage {
        fn save(&self, key: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>> {
            if self.failing.load(Ordering::SeqCst) {
                return Box::pin(async { Err(StorageError::Io("disk full".to_string())) });
            }
            self.inner.save(key, document)
        }

        fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Document>> {
            self.inner.load(key)
        }

        fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
            self.inner.delete(key)
        }

        fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
            self.inner.list()
        }

        fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
            self.inner.exists(key)
        }
    }

    fn edit(editor: &mut Editor) {
        editor.add_element(ElementKind::Rectangle, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_fresh_saver_is_clean() {
        let mut saver = AutoSaver::new(Arc::new(MemoryStorage::new()), DEFAULT_DOCUMENT_KEY);
        let editor = Editor::default();
        saver.mark_saved(editor.revision());
        assert_eq!(saver.status(), SaveStatus::Saved);
        assert!(saver.tick(&editor, Instant::now()).is_none());
    }

    #[test]
    fn test_save_waits_for_debounce() {
        let storage = Arc::new(MemoryStorage::new());
        let mut saver = AutoSaver::new(Arc::clone(&storage), "board");
        let mut editor = Editor::default();
        saver.mark_saved(editor.revision());
        let start = Instant::now();

        edit(&mut editor);
        assert!(saver.tick(&editor, start).is_none());
        assert_eq!(saver.status(), SaveStatus::Pending);
        assert!(saver.tick(&editor, start + Duration::from_millis(1500)).is_none());

        // Another edit restarts the quiet period
        edit(&mut editor);
        assert!(saver.tick(&editor, start + Duration::from_millis(1900)).is_none());
        assert!(saver.tick(&editor, start + Duration::from_millis(3000)).is_none());

        let pending = saver.tick(&editor, start + Duration::from_millis(3900)).unwrap();
        let outcome = block_on(pending.run());
        assert_eq!(saver.finish(outcome, start + Duration::from_secs(4)), SaveStatus::Saved);

        let stored = block_on(storage.load("board")).unwrap();
        assert_eq!(stored.elements.len(), 2);
    }

    #[test]
    fn test_edit_during_save_stays_dirty() {
        let mut saver = AutoSaver::new(Arc::new(MemoryStorage::new()), "board");
        let mut editor = Editor::default();
        saver.mark_saved(editor.revision());
        let start = Instant::now();

        edit(&mut editor);
        saver.tick(&editor, start);
        let pending = saver.tick(&editor, start + DEFAULT_DEBOUNCE).unwrap();

        // Edit lands while the write is in flight
        edit(&mut editor);
        assert!(saver.tick(&editor, start + DEFAULT_DEBOUNCE).is_none());

        let outcome = block_on(pending.run());
        let status = saver.finish(outcome, start + DEFAULT_DEBOUNCE);
        assert_eq!(status, SaveStatus::Pending);
        assert!(saver.is_dirty());

        let next = saver.tick(&editor, start + DEFAULT_DEBOUNCE * 2).unwrap();
        assert_eq!(next.revision(), editor.revision());
    }

    #[test]
    fn test_failed_save_is_unsaved_and_retried() {
        let storage = Arc::new(FlakyStorage::default());
        let mut saver = AutoSaver::new(Arc::clone(&storage), "board");
        let mut editor = Editor::default();
        saver.mark_saved(editor.revision());
        let start = Instant::now();

        edit(&mut editor);
        storage.failing.store(true, Ordering::SeqCst);
        saver.tick(&editor, start);
        let pending = saver.tick(&editor, start + DEFAULT_DEBOUNCE).unwrap();
        let failed_at = start + DEFAULT_DEBOUNCE;
        assert_eq!(saver.finish(block_on(pending.run()), failed_at), SaveStatus::Unsaved);

        // The document itself is untouched
        assert_eq!(editor.document().elements.len(), 1);

        // Retry waits for the next cycle
        storage.failing.store(false, Ordering::SeqCst);
        assert!(saver.tick(&editor, failed_at + Duration::from_millis(500)).is_none());
        let retry = saver.tick(&editor, failed_at + DEFAULT_DEBOUNCE).unwrap();
        assert_eq!(
            saver.finish(block_on(retry.run()), failed_at + DEFAULT_DEBOUNCE),
            SaveStatus::Saved
        );
        assert!(block_on(storage.exists("board")).unwrap());
    }

    #[test]
    fn test_save_now_and_restore() {
        let storage = Arc::new(MemoryStorage::new());
        let mut saver = AutoSaver::new(Arc::clone(&storage), "board");
        let mut editor = Editor::default();
        edit(&mut editor);
        editor.zoom_in();
        assert_eq!(block_on(saver.save_now(&editor)), SaveStatus::Saved);

        let mut other = Editor::default();
        let mut other_saver = AutoSaver::new(storage, "board");
        assert!(block_on(other_saver.restore(&mut other)));
        assert_eq!(other.document().elements.len(), 1);
        assert!((other.viewport().zoom - 1.2).abs() < 1e-9);
        assert_eq!(other_saver.status(), SaveStatus::Saved);
    }

    #[test]
    fn test_restore_missing_document() {
        let mut saver = AutoSaver::new(Arc::new(MemoryStorage::new()), "missing");
        let mut editor = Editor::default();
        assert!(!block_on(saver.restore(&mut editor)));
        assert!(editor.document().is_empty());
    }
}

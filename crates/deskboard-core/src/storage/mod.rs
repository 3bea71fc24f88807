//! Storage abstraction for persistence.

mod autosave;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local;

pub use autosave::{AutoSaver, DEFAULT_DEBOUNCE, DEFAULT_DOCUMENT_KEY, PendingSave, SaveOutcome, SaveStatus};
pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use crate::document::Document;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Trait for document storage backends.
///
/// On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    /// Save a document under `key`, replacing any previous value.
    fn save(&self, key: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the document stored under `key`.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Document>>;

    /// Delete a document. Missing keys are not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all document keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a document exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Trait for document storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    /// Save a document under `key`, replacing any previous value.
    fn save(&self, key: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the document stored under `key`.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Document>>;

    /// Delete a document. Missing keys are not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all document keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a document exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Load the document stored under `key`. A missing document loads as a
/// new empty one.
pub async fn load_document<S: Storage + ?Sized>(storage: &S, key: &str) -> StorageResult<Document> {
    match storage.load(key).await {
        Err(StorageError::NotFound(_)) => {
            log::info!("{key} not found, starting a new document");
            Ok(Document::new())
        }
        result => result,
    }
}

/// Overwrite `key` with `document`. Failures are logged and reported as
/// [`SaveStatus::Unsaved`].
pub async fn save_document<S: Storage + ?Sized>(storage: &S, key: &str, document: &Document) -> SaveStatus {
    match storage.save(key, document).await {
        Ok(()) => SaveStatus::Saved,
        Err(e) => {
            log::warn!("failed to save {key}: {e}");
            SaveStatus::Unsaved
        }
    }
}

/// Simple blocking executor for tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::document::Document;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-memory storage for testing and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: RwLock<HashMap<String, Document>>,
}

fn lock_error<T>(e: PoisonError<T>) -> StorageError {
    StorageError::Other(format!("Lock error: {e}"))
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let document = document.clone();
        Box::pin(async move {
            self.documents.write().map_err(lock_error)?.insert(key, document);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let key = key.to_string();
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            docs.get(&key).cloned().ok_or(StorageError::NotFound(key))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            self.documents.write().map_err(lock_error)?.remove(&key);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            let mut keys: Vec<String> = docs.keys().cloned().collect();
            keys.sort();
            Ok(keys)
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            Ok(docs.contains_key(&key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use crate::storage::block_on;
    use crate::tools::ToolSettings;
    use kurbo::Point;

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let mut doc = Document::new();
        doc.add_element(ElementKind::Rectangle, Point::new(1.0, 2.0), &ToolSettings::default());

        block_on(storage.save("board", &doc)).unwrap();
        let loaded = block_on(storage.load("board")).unwrap();

        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));

        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        let doc = Document::new();

        assert!(!block_on(storage.exists("board")).unwrap());
        block_on(storage.save("board", &doc)).unwrap();
        assert!(block_on(storage.exists("board")).unwrap());

        block_on(storage.delete("board")).unwrap();
        assert!(!block_on(storage.exists("board")).unwrap());
        // Deleting again is fine
        block_on(storage.delete("board")).unwrap();
    }

    #[test]
    fn test_list() {
        let storage = MemoryStorage::new();
        let doc = Document::new();

        block_on(storage.save("b", &doc)).unwrap();
        block_on(storage.save("a", &doc)).unwrap();

        assert_eq!(block_on(storage.list()).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_save_overwrites() {
        let storage = MemoryStorage::new();
        let mut doc = Document::new();
        block_on(storage.save("board", &doc)).unwrap();

        doc.name = "Sprint planning".to_string();
        block_on(storage.save("board", &doc)).unwrap();

        assert_eq!(block_on(storage.load("board")).unwrap().name, "Sprint planning");
    }
}

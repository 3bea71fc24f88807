//! Browser `localStorage` implementation for WebAssembly.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::document::Document;
use web_sys::Storage as WebStorage;

/// Prefix for all keys written by this backend.
const KEY_PREFIX: &str = "deskboard:";

/// Stores documents as JSON strings in `window.localStorage`.
///
/// Not Send/Sync; WASM is single-threaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn web_storage() -> StorageResult<WebStorage> {
        let window = web_sys::window().ok_or_else(|| StorageError::Other("No window object".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StorageError::Other(format!("localStorage error: {e:?}")))?
            .ok_or_else(|| StorageError::Other("localStorage not available".to_string()))
    }

    fn item_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }
}

impl Storage for LocalStorage {
    fn save(&self, key: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>> {
        let item_key = Self::item_key(key);
        let json = document.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            // Quota errors surface here
            Self::web_storage()?
                .set_item(&item_key, &json)
                .map_err(|e| StorageError::Io(format!("Failed to write {item_key}: {e:?}")))
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let item_key = Self::item_key(key);
        let key = key.to_string();
        Box::pin(async move {
            let json = Self::web_storage()?
                .get_item(&item_key)
                .map_err(|e| StorageError::Io(format!("Failed to read {item_key}: {e:?}")))?
                .ok_or(StorageError::NotFound(key))?;
            Document::from_json(&json).map_err(|e| StorageError::Serialization(e.to_string()))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let item_key = Self::item_key(key);
        Box::pin(async move {
            Self::web_storage()?
                .remove_item(&item_key)
                .map_err(|e| StorageError::Io(format!("Failed to delete {item_key}: {e:?}")))
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let storage = Self::web_storage()?;
            let len = storage
                .length()
                .map_err(|e| StorageError::Io(format!("Failed to list keys: {e:?}")))?;
            let mut keys = Vec::new();
            for index in 0..len {
                if let Ok(Some(item_key)) = storage.key(index) {
                    if let Some(key) = item_key.strip_prefix(KEY_PREFIX) {
                        keys.push(key.to_string());
                    }
                }
            }
            keys.sort();
            Ok(keys)
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let item_key = Self::item_key(key);
        Box::pin(async move {
            let item = Self::web_storage()?
                .get_item(&item_key)
                .map_err(|e| StorageError::Io(format!("Failed to read {item_key}: {e:?}")))?;
            Ok(item.is_some())
        })
    }
}

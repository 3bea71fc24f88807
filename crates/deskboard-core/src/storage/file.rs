//! File-based storage implementation for native platforms.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::document::Document;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores documents as pretty-printed JSON files in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::Io(format!("Failed to create {}: {e}", base_path.display()))
        })?;
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/deskboard/boards/`
    /// On Windows: `%LOCALAPPDATA%\deskboard\boards\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("deskboard").join("boards"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn document_path(&self, key: &str) -> PathBuf {
        // Keys become file names
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe_key}.json"))
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(key);
        let json = document.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            // Write then rename so a failed write never truncates the previous save
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json)
                .and_then(|()| fs::rename(&tmp, &path))
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))?;
            log::debug!("saved {}", path.display());
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let path = self.document_path(key);
        let key = key.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }
            let json = fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {e}", path.display())))?;
            Document::from_json(&json).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {e}", path.display()))
            })
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(key);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {e}", path.display()))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let entries = fs::read_dir(&self.base_path)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {e}")))?;

            let mut keys: Vec<String> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
                .collect();
            keys.sort();
            Ok(keys)
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.document_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}

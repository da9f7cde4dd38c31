//! File-based Local Storage Adapter
//!
//! Keeps every key of one client in a single JSON object on disk. A batch is
//! applied to the whole map and written to a sibling temp file, then renamed
//! over the old file, so readers see either all of a batch or none of it.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::ports::{LocalStorage, StorageChange, StorageError};

/// JSON-file storage for one widget client
#[derive(Debug)]
pub struct FileLocalStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileLocalStorage {
    /// Create a storage backed by the given file
    ///
    /// The file and its parent directory are created on first write.
    ///
    /// # Example
    /// ```ignore
    /// let storage = FileLocalStorage::new("./data/widget-state.json");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::IoError(e.to_string())),
        };

        serde_json::from_str(&json).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| StorageError::IoError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

        let temp = self.temp_path();
        fs::write(&temp, json)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl LocalStorage for FileLocalStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn write_batch(&self, changes: Vec<StorageChange>) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;

        for (key, value) in changes {
            match value {
                Some(value) => map.insert(key, value),
                None => map.remove(&key),
            };
        }

        self.write_map(&map).await
    }
}

//! Local Storage Port - Client-side key/value persistence.
//!
//! Mirrors what a browser widget gets from `localStorage`: string keys,
//! string values, scoped to one client. Writes go through `write_batch` so
//! several keys can change in one step.

use async_trait::async_trait;

/// Errors that can occur during local storage operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to serialize value: {0}")]
    SerializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(String),
}

/// One pending change: `Some` sets the key, `None` removes it.
pub type StorageChange = (String, Option<String>);

/// Port for client-local key/value persistence
#[async_trait]
pub trait LocalStorage: Send + Sync {
    /// Read one key
    ///
    /// # Returns
    /// `None` if the key is not set
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Apply several changes as one unit
    ///
    /// # Errors
    /// Returns `StorageError` if the batch could not be persisted; in that
    /// case none of the changes are visible.
    async fn write_batch(&self, changes: Vec<StorageChange>) -> Result<(), StorageError>;

    /// Set one key
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write_batch(vec![(key.to_string(), Some(value.to_string()))])
            .await
    }

    /// Remove several keys together
    async fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.write_batch(keys.iter().map(|k| (k.to_string(), None)).collect())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_io_displays() {
        let err = StorageError::IoError("permission denied".to_string());
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn storage_error_corrupt_displays() {
        let err = StorageError::Corrupt("expected object".to_string());
        assert!(err.to_string().contains("corrupt"));
    }
}

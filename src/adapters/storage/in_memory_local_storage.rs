//! In-Memory Local Storage Adapter
//!
//! Keeps keys in a map for the lifetime of the process.
//! Useful for testing and for hosts without a writable disk.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{LocalStorage, StorageChange, StorageError};

/// In-memory storage for one widget client
#[derive(Debug, Clone, Default)]
pub struct InMemoryLocalStorage {
    items: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryLocalStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data (useful for tests)
    pub async fn clear(&self) {
        self.items.write().await.clear();
    }

    /// Get the number of stored keys
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Check whether nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl LocalStorage for InMemoryLocalStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn write_batch(&self, changes: Vec<StorageChange>) -> Result<(), StorageError> {
        // One write guard for the whole batch.
        let mut items = self.items.write().await;
        for (key, value) in changes {
            match value {
                Some(value) => items.insert(key, value),
                None => items.remove(&key),
            };
        }
        Ok(())
    }
}

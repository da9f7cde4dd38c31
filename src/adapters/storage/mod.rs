//! Storage Adapters
//!
//! Implementations of the LocalStorage port for persisting widget state.
//!
//! ## Available Adapters
//!
//! - **FileLocalStorage** - Stores all keys as one JSON file on disk
//! - **InMemoryLocalStorage** - Stores keys in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileLocalStorage, InMemoryLocalStorage};
//!
//! // Survives restarts: file-based storage
//! let storage = FileLocalStorage::new("./data/widget-state.json");
//!
//! // Testing: in-memory storage
//! let storage = InMemoryLocalStorage::new();
//! ```

mod file_local_storage;
mod in_memory_local_storage;

pub use file_local_storage::FileLocalStorage;
pub use in_memory_local_storage::InMemoryLocalStorage;

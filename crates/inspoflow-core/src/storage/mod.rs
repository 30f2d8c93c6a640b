//! Storage collaborator: where analyzed items and their screenshots end up.
//!
//! The pipeline only talks to the [`ItemStore`] and [`MediaStore`] traits.
//! [`RestStore`] implements both against a PostgREST-style API;
//! [`MemoryStore`] keeps everything in process.

pub mod guard;
pub mod memory;
pub mod rest;

pub use guard::{DuplicateCheck, DuplicateGuard};
pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::error::StorageError;
use crate::types::SavedItem;
use async_trait::async_trait;
use uuid::Uuid;

/// Row store for saved items.
///
/// Uses `async_trait` because the ingestor holds stores as `Arc<dyn ItemStore>`.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a new item.
    async fn create(&self, item: &SavedItem) -> Result<(), StorageError>;

    /// All items, newest first.
    async fn list(&self) -> Result<Vec<SavedItem>, StorageError>;

    /// Whether any item has exactly this `url` (byte-for-byte).
    async fn url_exists(&self, url: &str) -> Result<bool, StorageError>;

    /// Case-insensitive substring search over title and summary, newest
    /// first. An empty query lists everything.
    async fn search(&self, query: &str) -> Result<Vec<SavedItem>, StorageError>;

    /// Delete the item with this id.
    async fn delete(&self, id: Uuid) -> Result<(), StorageError>;
}

/// Object storage for screenshot uploads.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `bytes` under `filename` and return its public URL.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

//! In-process store, used for dry runs and tests.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{ItemStore, MediaStore};
use crate::error::StorageError;
use crate::types::SavedItem;

/// Keeps items and uploads in memory. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<Vec<SavedItem>>,
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored items in insertion order.
    pub fn items(&self) -> Vec<SavedItem> {
        lock(&self.items).clone()
    }

    /// Filenames of uploaded objects in upload order.
    pub fn uploaded_files(&self) -> Vec<String> {
        lock(&self.uploads)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn newest_first(mut items: Vec<SavedItem>) -> Vec<SavedItem> {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn create(&self, item: &SavedItem) -> Result<(), StorageError> {
        let mut items = lock(&self.items);
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(StorageError::Service {
                status: 409,
                body: format!("duplicate key: {}", item.id),
            });
        }
        items.push(item.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SavedItem>, StorageError> {
        Ok(newest_first(self.items()))
    }

    async fn url_exists(&self, url: &str) -> Result<bool, StorageError> {
        Ok(lock(&self.items)
            .iter()
            .any(|item| item.url.as_deref() == Some(url)))
    }

    async fn search(&self, query: &str) -> Result<Vec<SavedItem>, StorageError> {
        if query.is_empty() {
            return self.list().await;
        }
        let needle = query.to_lowercase();
        let matches = lock(&self.items)
            .iter()
            .filter(|item| {
                item.title.to_lowercase().contains(&needle)
                    || item
                        .summary
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        Ok(newest_first(matches))
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        lock(&self.items).retain(|item| item.id != id);
        Ok(())
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        lock(&self.uploads).push((filename.to_string(), bytes));
        Ok(format!("memory://uploads/{filename}"))
    }
}

//! Pre-commit duplicate check.

use super::ItemStore;
use crate::error::StorageError;

/// Result of a duplicate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateCheck {
    Unique,
    Duplicate,
}

/// Asks the store whether a URL is already saved.
///
/// Matching is exact and case-sensitive: `https://a.dev`, `https://a.dev/`
/// and `HTTPS://A.DEV` are three different URLs.
pub struct DuplicateGuard<'a> {
    store: &'a dyn ItemStore,
}

impl<'a> DuplicateGuard<'a> {
    pub fn new(store: &'a dyn ItemStore) -> Self {
        Self { store }
    }

    pub async fn check(&self, url: &str) -> Result<DuplicateCheck, StorageError> {
        if self.store.url_exists(url).await? {
            tracing::debug!("Duplicate URL: {url}");
            Ok(DuplicateCheck::Duplicate)
        } else {
            Ok(DuplicateCheck::Unique)
        }
    }
}

//! Screenshot ingestion: analyze, dedupe, upload, save.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::storage::{DuplicateCheck, DuplicateGuard, ItemStore, MediaStore, RestStore};
use crate::tags::merge_unique;
use crate::types::{AnalysisResult, ItemType, SavedItem};
use crate::vision::{resize, VisionClient};

/// Quality of the stored full-size screenshot.
pub const UPLOAD_JPEG_QUALITY: u8 = 80;

/// What happened to an ingested screenshot.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Uploaded and written to the item store
    Saved(SavedItem),

    /// An item with this URL already exists; nothing was written
    Duplicate { url: String },
}

/// Runs one screenshot from raw bytes to a saved item.
pub struct Ingestor {
    vision: VisionClient,
    items: Arc<dyn ItemStore>,
    media: Arc<dyn MediaStore>,
    upload_quality: u8,
}

impl Ingestor {
    pub fn new(vision: VisionClient, items: Arc<dyn ItemStore>, media: Arc<dyn MediaStore>) -> Self {
        Self {
            vision,
            items,
            media,
            upload_quality: UPLOAD_JPEG_QUALITY,
        }
    }

    /// Vision client plus a REST store serving as both item and media store.
    pub fn from_config(config: &Config) -> std::result::Result<Self, ConfigError> {
        let vision = VisionClient::from_config(&config.vision)?;
        let store = Arc::new(RestStore::from_config(&config.storage)?);
        Ok(Self::new(vision, store.clone(), store))
    }

    pub fn with_upload_quality(mut self, quality: u8) -> Self {
        self.upload_quality = quality;
        self
    }

    pub fn vision(&self) -> &VisionClient {
        &self.vision
    }

    /// Analyze then save.
    pub async fn ingest(&self, image_bytes: &[u8]) -> Result<IngestOutcome> {
        let analysis = self.vision.analyze(image_bytes).await?;
        self.save_analysis(&analysis, image_bytes).await
    }

    /// Save an analysis that has already been produced for `image_bytes`.
    pub async fn save_analysis(
        &self,
        analysis: &AnalysisResult,
        image_bytes: &[u8],
    ) -> Result<IngestOutcome> {
        let url = resolve_url(analysis.url.as_deref());

        if let Some(url) = &url {
            match DuplicateGuard::new(self.items.as_ref()).check(url).await {
                Ok(DuplicateCheck::Duplicate) => {
                    tracing::info!("Skipping duplicate: {url}");
                    return Ok(IngestOutcome::Duplicate { url: url.clone() });
                }
                Ok(DuplicateCheck::Unique) => {}
                Err(e) => tracing::warn!("Duplicate check failed, saving anyway: {e}"),
            }
        }

        let id = Uuid::new_v4();
        let jpeg = resize::reencode_blocking(image_bytes.to_vec(), self.upload_quality).await?;
        let filename = format!("{id}.jpg");
        let image_url = self.media.upload(jpeg, &filename, "image/jpeg").await?;

        let category = analysis.category.as_str().to_string();
        let item = SavedItem {
            id,
            url,
            created_at: Utc::now(),
            item_type: ItemType::from_category(analysis.category),
            image_url: Some(image_url),
            title: analysis.title.clone(),
            summary: Some(analysis.summary.clone()),
            tags: merge_unique(&analysis.tags, &[category]),
        };

        self.items.create(&item).await?;
        tracing::info!("Saved \"{}\" as {}", item.title, item.id);
        Ok(IngestOutcome::Saved(item))
    }
}

/// Normalize an extracted URL for storage.
///
/// Blank input is absent. A scheme-less value gets `https://`; anything
/// still not an absolute URL with a host is dropped.
pub fn resolve_url(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let candidate = if raw.to_ascii_lowercase().starts_with("http") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    match url::Url::parse(&candidate) {
        Ok(parsed) if parsed.host().is_some() => Some(candidate),
        _ => {
            tracing::debug!("Dropping unusable URL {raw:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InspoError, StorageError};
    use crate::signing::{Credentials, RequestSigner};
    use crate::storage::MemoryStore;
    use crate::types::Category;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(40, 20)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn offline_vision() -> VisionClient {
        let signer = RequestSigner::new(
            Credentials::new("AKIDEXAMPLE", "secret"),
            "us-east-1",
            "rekognition",
        );
        VisionClient::new(signer, "http://127.0.0.1:1/", "RekognitionService.DetectText")
    }

    fn ingestor(store: &Arc<MemoryStore>) -> Ingestor {
        Ingestor::new(offline_vision(), store.clone(), store.clone())
    }

    fn analysis(category: Category, url: Option<&str>) -> AnalysisResult {
        AnalysisResult {
            title: "Beautiful UI components".to_string(),
            summary: "Get Started".to_string(),
            category,
            tags: vec!["react".to_string()],
            url: url.map(String::from),
        }
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(resolve_url(None), None);
        assert_eq!(resolve_url(Some("  ")), None);
        assert_eq!(resolve_url(Some("21st.dev")), Some("https://21st.dev".to_string()));
        assert_eq!(
            resolve_url(Some("http://example.com/a")),
            Some("http://example.com/a".to_string())
        );
        assert_eq!(
            resolve_url(Some("HTTPS://Example.com")),
            Some("HTTPS://Example.com".to_string())
        );
        assert_eq!(resolve_url(Some("not a url")), None);
    }

    #[tokio::test]
    async fn test_save_uploads_and_writes_item() {
        let store = Arc::new(MemoryStore::new());
        let outcome = ingestor(&store)
            .save_analysis(&analysis(Category::App, Some("21st.dev")), &png_bytes())
            .await
            .unwrap();

        let IngestOutcome::Saved(item) = outcome else {
            panic!("expected a saved item");
        };
        assert_eq!(item.url.as_deref(), Some("https://21st.dev"));
        assert_eq!(item.item_type, ItemType::App);
        assert_eq!(item.tags, vec!["react", "app"]);
        assert_eq!(
            item.image_url,
            Some(format!("memory://uploads/{}.jpg", item.id))
        );
        assert_eq!(store.items(), vec![item.clone()]);
        assert_eq!(store.uploaded_files(), vec![format!("{}.jpg", item.id)]);
    }

    #[tokio::test]
    async fn test_duplicate_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(&store);
        let first = analysis(Category::Website, Some("https://21st.dev"));
        ingestor.save_analysis(&first, &png_bytes()).await.unwrap();

        let outcome = ingestor.save_analysis(&first, &png_bytes()).await.unwrap();
        assert_eq!(
            outcome,
            IngestOutcome::Duplicate {
                url: "https://21st.dev".to_string()
            }
        );
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.uploaded_files().len(), 1);
    }

    #[tokio::test]
    async fn test_items_without_url_are_never_duplicates() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(&store);
        let result = analysis(Category::Website, None);
        ingestor.save_analysis(&result, &png_bytes()).await.unwrap();
        ingestor.save_analysis(&result, &png_bytes()).await.unwrap();

        let items = store.items();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.url.is_none()));
        assert_eq!(items[0].item_type, ItemType::Website);
        assert_eq!(items[0].tags, vec!["react", "website"]);
    }

    /// Item store whose reads fail but writes succeed.
    struct FlakyReads(MemoryStore);

    #[async_trait]
    impl ItemStore for FlakyReads {
        async fn create(&self, item: &SavedItem) -> std::result::Result<(), StorageError> {
            self.0.create(item).await
        }
        async fn list(&self) -> std::result::Result<Vec<SavedItem>, StorageError> {
            self.0.list().await
        }
        async fn url_exists(&self, _url: &str) -> std::result::Result<bool, StorageError> {
            Err(StorageError::Network {
                message: "offline".to_string(),
            })
        }
        async fn search(&self, query: &str) -> std::result::Result<Vec<SavedItem>, StorageError> {
            self.0.search(query).await
        }
        async fn delete(&self, id: Uuid) -> std::result::Result<(), StorageError> {
            self.0.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_failed_duplicate_check_still_saves() {
        let items = Arc::new(FlakyReads(MemoryStore::new()));
        let media = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(offline_vision(), items.clone(), media);

        let outcome = ingestor
            .save_analysis(&analysis(Category::Website, Some("https://a.dev")), &png_bytes())
            .await
            .unwrap();
        assert!(matches!(outcome, IngestOutcome::Saved(_)));
        assert_eq!(items.0.items().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_image_is_not_saved() {
        let store = Arc::new(MemoryStore::new());
        let err = ingestor(&store)
            .save_analysis(&analysis(Category::Website, None), b"garbage")
            .await
            .unwrap_err();
        assert!(matches!(err, InspoError::Pipeline(_)));
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_propagates_analysis_errors() {
        let store = Arc::new(MemoryStore::new());
        let err = ingestor(&store).ingest(&png_bytes()).await.unwrap_err();
        assert!(matches!(err, InspoError::Pipeline(_)));
        assert!(store.uploaded_files().is_empty());
    }
}

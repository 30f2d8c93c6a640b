//! PostgREST row store plus object storage, as exposed by a Supabase project.
//!
//! Rows live at `/rest/v1/{table}`; screenshots are uploaded to
//! `/storage/v1/object/{bucket}/{filename}` and served from the matching
//! `/object/public/` path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::{ItemStore, MediaStore};
use crate::config::{require_credential, StorageConfig};
use crate::error::{ConfigError, StorageError};
use crate::tags::{self, CanonicalTagValue};
use crate::types::{ItemType, SavedItem};

/// Row as written to the table.
#[derive(Serialize)]
struct NewRow<'a> {
    id: Uuid,
    url: Option<&'a str>,
    title: &'a str,
    summary: Option<&'a str>,
    #[serde(rename = "type")]
    item_type: &'static str,
    created_at: String,
    s3_url: Option<&'a str>,
    tags: CanonicalTagValue,
}

impl<'a> From<&'a SavedItem> for NewRow<'a> {
    fn from(item: &'a SavedItem) -> Self {
        Self {
            id: item.id,
            url: item.url.as_deref(),
            title: &item.title,
            summary: item.summary.as_deref(),
            item_type: item.item_type.as_str(),
            created_at: item.created_at.to_rfc3339(),
            s3_url: item.image_url.as_deref(),
            tags: tags::encode(&item.tags),
        }
    }
}

/// Row as read back. Older clients left some columns empty or null;
/// only `id`, `title` and `created_at` are required.
#[derive(Deserialize)]
struct StoredRow {
    id: Uuid,
    #[serde(default)]
    url: Option<String>,
    title: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(rename = "type", default)]
    item_type: Option<String>,
    created_at: String,
    #[serde(default)]
    s3_url: Option<String>,
    #[serde(default)]
    tags: Option<CanonicalTagValue>,
}

impl StoredRow {
    fn into_item(self) -> Result<SavedItem, String> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| format!("bad created_at {:?}: {e}", self.created_at))?
            .with_timezone(&Utc);

        Ok(SavedItem {
            id: self.id,
            url: self.url.filter(|u| !u.is_empty()),
            created_at,
            item_type: ItemType::parse(self.item_type.as_deref().unwrap_or_default()),
            image_url: self.s3_url.filter(|u| !u.is_empty()),
            title: self.title,
            summary: self.summary,
            tags: tags::decode(self.tags),
        })
    }
}

/// Decode a JSON array of rows, skipping rows that don't fit the schema.
fn decode_rows(body: &[u8]) -> Result<Vec<SavedItem>, StorageError> {
    let raw: Vec<serde_json::Value> =
        serde_json::from_slice(body).map_err(|e| StorageError::Decode {
            message: format!("expected an array of rows: {e}"),
        })?;

    let mut items = Vec::with_capacity(raw.len());
    for value in raw {
        let decoded = serde_json::from_value::<StoredRow>(value)
            .map_err(|e| e.to_string())
            .and_then(StoredRow::into_item);
        match decoded {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!("Skipping unreadable row: {e}"),
        }
    }
    Ok(items)
}

/// `"%query%"` quoted for a PostgREST `or=(...)` list, so commas and
/// parentheses in the query stay inside the value.
fn ilike_pattern(query: &str) -> String {
    let escaped = query.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"%{escaped}%\"")
}

/// Supabase-backed store.
pub struct RestStore {
    base_url: String,
    api_key: String,
    table: String,
    bucket: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, table: &str, bucket: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
            bucket: bucket.to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(StorageConfig::default().timeout_ms),
        }
    }

    /// Build from config, resolving `${ENV_VAR}` references.
    pub fn from_config(config: &StorageConfig) -> Result<Self, ConfigError> {
        let url = require_credential(&config.url, "storage.url")?;
        let key = require_credential(&config.anon_key, "storage.anon_key")?;
        if url::Url::parse(&url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "storage.url is not a valid URL: {url}"
            )));
        }
        Ok(Self::new(&url, &key, &config.table, &config.bucket)
            .with_timeout(Duration::from_millis(config.timeout_ms)))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn table_url(&self, query: &str) -> String {
        if query.is_empty() {
            format!("{}/rest/v1/{}", self.base_url, self.table)
        } else {
            format!("{}/rest/v1/{}?{query}", self.base_url, self.table)
        }
    }

    /// Public URL for an uploaded object.
    pub fn public_url(&self, filename: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{filename}",
            self.base_url, self.bucket
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .timeout(self.timeout)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Send and return the body of a 2xx response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, StorageError> {
        let resp = request.send().await.map_err(|e| StorageError::Network {
            message: e.to_string(),
        })?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| StorageError::Network {
            message: format!("failed to read response: {e}"),
        })?;

        if !status.is_success() {
            return Err(StorageError::Service {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, StorageError> {
        let body = self.send(self.request(reqwest::Method::GET, url)).await?;
        serde_json::from_slice(&body).map_err(|e| StorageError::Decode {
            message: e.to_string(),
        })
    }

    async fn get_rows(&self, query: &str) -> Result<Vec<SavedItem>, StorageError> {
        let url = self.table_url(query);
        let body = self.send(self.request(reqwest::Method::GET, &url)).await?;
        decode_rows(&body)
    }
}

#[async_trait]
impl ItemStore for RestStore {
    async fn create(&self, item: &SavedItem) -> Result<(), StorageError> {
        let request = self
            .request(reqwest::Method::POST, &self.table_url(""))
            .header("Prefer", "return=minimal")
            .json(&NewRow::from(item));
        self.send(request).await?;
        tracing::debug!("Inserted item {}", item.id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SavedItem>, StorageError> {
        self.get_rows("select=*&order=created_at.desc").await
    }

    async fn url_exists(&self, url: &str) -> Result<bool, StorageError> {
        let query = format!("url=eq.{}&select=id&limit=1", urlencoding::encode(url));
        let rows: Vec<serde_json::Value> = self.get_json(&self.table_url(&query)).await?;
        Ok(!rows.is_empty())
    }

    async fn search(&self, query: &str) -> Result<Vec<SavedItem>, StorageError> {
        if query.is_empty() {
            return self.list().await;
        }
        let pattern = urlencoding::encode(&ilike_pattern(query)).into_owned();
        let filter = format!(
            "or=(title.ilike.{pattern},summary.ilike.{pattern})&order=created_at.desc"
        );
        self.get_rows(&filter).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        let url = self.table_url(&format!("id=eq.{id}"));
        self.send(self.request(reqwest::Method::DELETE, &url)).await?;
        Ok(())
    }
}

#[async_trait]
impl MediaStore for RestStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if filename.is_empty() || filename.contains(['/', '?', '#']) {
            return Err(StorageError::InvalidEndpoint(format!(
                "object name {filename:?} is not a single path segment"
            )));
        }
        let url = format!(
            "{}/storage/v1/object/{}/{filename}",
            self.base_url, self.bucket
        );
        let size = bytes.len();
        let request = self
            .request(reqwest::Method::POST, &url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        self.send(request).await?;
        tracing::debug!("Uploaded {filename} ({size} bytes)");
        Ok(self.public_url(filename))
    }
}

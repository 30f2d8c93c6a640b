//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// OCR provider (Rekognition `DetectText`) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Provider region, part of the endpoint host and the credential scope
    pub region: String,

    /// Signing service name, also the first label of the endpoint host
    pub service: String,

    /// Domain suffix of the endpoint host
    pub host_suffix: String,

    /// Value of the `X-Amz-Target` header
    pub target: String,

    /// Full endpoint URL override (local fakes, proxies, VPC endpoints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Access key id (supports ${ENV_VAR} syntax)
    pub access_key: String,

    /// Secret access key (supports ${ENV_VAR} syntax)
    pub secret_key: String,

    /// Images are scaled to fit a square box of this many pixels
    pub max_dimension: u32,

    /// JPEG quality used when re-encoding, 1-100
    pub jpeg_quality: u8,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            service: "rekognition".to_string(),
            host_suffix: "amazonaws.com".to_string(),
            target: "RekognitionService.DetectText".to_string(),
            endpoint: None,
            access_key: "${AWS_ACCESS_KEY_ID}".to_string(),
            secret_key: "${AWS_SECRET_ACCESS_KEY}".to_string(),
            max_dimension: 1024,
            jpeg_quality: 80,
            timeout_ms: 30_000,
        }
    }
}

impl VisionConfig {
    /// The URL requests are sent to: the override if set, otherwise
    /// `https://{service}.{region}.{host_suffix}/`.
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!(
                "https://{}.{}.{}/",
                self.service, self.region, self.host_suffix
            ),
        }
    }
}

/// Storage collaborator (PostgREST row store + object bucket) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Project base URL (supports ${ENV_VAR} syntax)
    pub url: String,

    /// Public API key sent as `apikey` and bearer token (supports ${ENV_VAR} syntax)
    pub anon_key: String,

    /// Table holding saved items
    pub table: String,

    /// Bucket receiving uploaded screenshots
    pub bucket: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: "${SUPABASE_URL}".to_string(),
            anon_key: "${SUPABASE_ANON_KEY}".to_string(),
            table: "saved_items".to_string(),
            bucket: "screenshots".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Caller-side retry settings.
///
/// The core never retries; these are read by the CLI around `analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max retry attempts for transient failures
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output
    pub pretty: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

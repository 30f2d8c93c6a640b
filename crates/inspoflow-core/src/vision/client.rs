//! Signed `DetectText` client.
//!
//! One call = prepare image → sign → POST → decode. The client keeps no
//! per-call state; its only shared piece is the status channel that reports
//! how many calls are in flight.

use chrono::Utc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use super::{resize, wire};
use crate::classify::TextClassifier;
use crate::config::{require_credential, VisionConfig};
use crate::error::{ConfigError, PipelineError, PipelineResult};
use crate::signing::{Credentials, RequestSigner};
use crate::types::{AnalysisResult, TextDetection};

/// Progress reported on the client's status channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisStatus {
    /// Calls currently between "started" and "returned"
    pub in_flight: usize,
}

impl AnalysisStatus {
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }
}

/// Marks one call as in flight until dropped, whichever way the call ends
/// (success, error, or the future being dropped).
struct BusyGuard<'a> {
    status: &'a watch::Sender<AnalysisStatus>,
}

impl<'a> BusyGuard<'a> {
    fn new(status: &'a watch::Sender<AnalysisStatus>) -> Self {
        status.send_modify(|s| s.in_flight += 1);
        Self { status }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.status
            .send_modify(|s| s.in_flight = s.in_flight.saturating_sub(1));
    }
}

/// OCR provider client.
pub struct VisionClient {
    signer: RequestSigner,
    endpoint: String,
    target: String,
    client: reqwest::Client,
    max_dimension: u32,
    jpeg_quality: u8,
    timeout: Duration,
    status: watch::Sender<AnalysisStatus>,
}

impl VisionClient {
    pub fn new(signer: RequestSigner, endpoint: &str, target: &str) -> Self {
        let defaults = VisionConfig::default();
        let (status, _) = watch::channel(AnalysisStatus::default());
        Self {
            signer,
            endpoint: endpoint.to_string(),
            target: target.to_string(),
            client: reqwest::Client::new(),
            max_dimension: defaults.max_dimension,
            jpeg_quality: defaults.jpeg_quality,
            timeout: Duration::from_millis(defaults.timeout_ms),
            status,
        }
    }

    /// Build a client from config, resolving `${ENV_VAR}` credentials.
    pub fn from_config(config: &VisionConfig) -> Result<Self, ConfigError> {
        let access_key = require_credential(&config.access_key, "vision.access_key")?;
        let secret_key = require_credential(&config.secret_key, "vision.secret_key")?;
        let signer = RequestSigner::new(
            Credentials::new(access_key, secret_key),
            &config.region,
            &config.service,
        );

        Ok(Self::new(signer, &config.endpoint_url(), &config.target)
            .with_bounding_box(config.max_dimension)
            .with_jpeg_quality(config.jpeg_quality)
            .with_timeout(Duration::from_millis(config.timeout_ms)))
    }

    /// Images are scaled to fit a `max_dimension` square before upload.
    pub fn with_bounding_box(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Watch in-flight calls (e.g. to drive a spinner).
    pub fn subscribe(&self) -> watch::Receiver<AnalysisStatus> {
        self.status.subscribe()
    }

    /// Current status snapshot.
    pub fn status(&self) -> AnalysisStatus {
        *self.status.borrow()
    }

    /// Detect text in an image. Detections keep the provider's order.
    ///
    /// No retries: a failed call returns its error immediately.
    pub async fn detect_text(&self, image_bytes: &[u8]) -> PipelineResult<Vec<TextDetection>> {
        let _busy = BusyGuard::new(&self.status);
        let start = Instant::now();

        let jpeg =
            resize::prepare_blocking(image_bytes.to_vec(), self.max_dimension, self.jpeg_quality)
                .await?;
        tracing::trace!("  Prepare: {:?} ({} bytes)", start.elapsed(), jpeg.len());

        let body = wire::request_body(&jpeg)?;
        let signed = self
            .signer
            .sign("POST", &self.endpoint, &self.target, body, Utc::now())?;

        let mut request = self.client.post(&signed.uri).timeout(self.timeout);
        for (name, value) in &signed.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let send_start = Instant::now();
        let resp = request
            .body(signed.body)
            .send()
            .await
            .map_err(|e| PipelineError::Network {
                message: format!("DetectText request failed: {e}"),
            })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| PipelineError::Network {
            message: format!("Failed to read DetectText response: {e}"),
        })?;
        tracing::trace!("  Send: {:?} (HTTP {status})", send_start.elapsed());

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            tracing::warn!("Vision provider returned HTTP {status}");
            return Err(PipelineError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let detections = wire::decode_detections(&bytes)?;
        tracing::debug!(
            "Received {} detections in {:?}",
            detections.len(),
            start.elapsed()
        );
        Ok(detections)
    }

    /// Detect text and classify it.
    pub async fn analyze(&self, image_bytes: &[u8]) -> PipelineResult<AnalysisResult> {
        let detections = self.detect_text(image_bytes).await?;
        Ok(TextClassifier::classify(&detections))
    }
}

//! Command implementations and the helpers they share.

pub mod analyze;
pub mod classify;
pub mod config;
pub mod ingest;
pub mod items;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use inspoflow_core::config::PipelineConfig;
use inspoflow_core::retry::{backoff_duration, is_retryable};
use inspoflow_core::{AnalysisResult, PipelineResult, VisionClient};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Read an image file into memory.
pub(crate) fn read_image(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Print a value to stdout as JSON.
pub(crate) fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

/// Run `analyze`, retrying transient failures with exponential backoff.
pub(crate) async fn analyze_with_retry(
    client: &VisionClient,
    image_bytes: &[u8],
    retry: &PipelineConfig,
) -> PipelineResult<AnalysisResult> {
    let mut attempt = 0;
    loop {
        match client.analyze(image_bytes).await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < retry.retry_attempts && is_retryable(&e) => {
                let delay = backoff_duration(attempt, retry.retry_delay_ms);
                tracing::warn!(
                    "Analysis failed (attempt {}/{}): {e}. Retrying in {delay:?}",
                    attempt + 1,
                    retry.retry_attempts + 1
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Spinner that follows the client's in-flight status.
pub(crate) struct Spinner {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl Spinner {
    pub(crate) fn follow(client: &VisionClient, message: &'static str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
            bar.set_style(style);
        }

        let mut status = client.subscribe();
        let task_bar = bar.clone();
        let task = tokio::spawn(async move {
            while status.changed().await.is_ok() {
                let busy = status.borrow_and_update().is_busy();
                task_bar.set_message(spinner_message(busy, message));
                if busy {
                    task_bar.enable_steady_tick(Duration::from_millis(100));
                } else {
                    task_bar.disable_steady_tick();
                }
            }
        });

        Self { bar, task }
    }

    pub(crate) fn finish(self) {
        self.task.abort();
        self.bar.finish_and_clear();
    }
}

/// The client only goes idle mid-command while waiting out a backoff.
fn spinner_message(busy: bool, message: &'static str) -> &'static str {
    if busy {
        message
    } else {
        "Retrying..."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspoflow_core::{Credentials, PipelineError, RequestSigner};
    use std::time::Instant;

    fn unreachable_client() -> VisionClient {
        let signer = RequestSigner::new(Credentials::new("AKID", "secret"), "us-east-1", "rekognition");
        VisionClient::new(signer, "http://127.0.0.1:1/", "RekognitionService.DetectText")
    }

    fn png_bytes() -> Vec<u8> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(8, 8)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[tokio::test]
    async fn test_network_errors_retried_with_backoff() {
        let retry = PipelineConfig {
            retry_attempts: 2,
            retry_delay_ms: 20,
        };
        let start = Instant::now();
        let err = analyze_with_retry(&unreachable_client(), &png_bytes(), &retry)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Network { .. }));
        // 20ms + 40ms of backoff between the three attempts
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_local_errors_not_retried() {
        let retry = PipelineConfig {
            retry_attempts: 5,
            retry_delay_ms: 10_000,
        };
        let err = analyze_with_retry(&unreachable_client(), b"nope", &retry)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Image { .. }));
    }

    #[test]
    fn test_spinner_message_between_attempts() {
        assert_eq!(spinner_message(true, "Reading text..."), "Reading text...");
        assert_eq!(spinner_message(false, "Reading text..."), "Retrying...");
    }

    #[test]
    fn test_read_image_names_missing_file() {
        let err = read_image(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.png"));
    }
}

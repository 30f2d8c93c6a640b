//! Retry helpers for callers of the vision client.
//!
//! The client itself never retries; callers decide with these.

use crate::error::PipelineError;
use std::time::Duration;

/// Determine whether a pipeline error is worth retrying.
///
/// Retryable: transport failures, rate limits (429), server errors (5xx).
/// Everything else (auth, bad request, bad image, bad response) fails the
/// same way twice.
pub fn is_retryable(error: &PipelineError) -> bool {
    match error {
        PipelineError::Network { .. } => true,
        PipelineError::Service { status, .. } => *status == 429 || (500..=599).contains(status),
        _ => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

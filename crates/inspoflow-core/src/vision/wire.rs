//! Request and response bodies for the `DetectText` action.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::types::{DetectionKind, TextDetection};

// --- Request types ---

#[derive(Serialize)]
struct DetectTextRequest {
    #[serde(rename = "Image")]
    image: ImagePayload,
}

#[derive(Serialize)]
struct ImagePayload {
    #[serde(rename = "Bytes")]
    bytes: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct DetectTextResponse {
    #[serde(rename = "TextDetections", default)]
    text_detections: Option<Vec<RawDetection>>,
}

#[derive(Deserialize)]
struct RawDetection {
    #[serde(rename = "DetectedText")]
    detected_text: String,
    #[serde(rename = "Type")]
    kind: DetectionKind,
    #[serde(rename = "Confidence")]
    confidence: f32,
}

/// `{"Image":{"Bytes":"<base64>"}}`
pub fn request_body(jpeg: &[u8]) -> Result<Vec<u8>, PipelineError> {
    let request = DetectTextRequest {
        image: ImagePayload {
            bytes: BASE64.encode(jpeg),
        },
    };
    serde_json::to_vec(&request).map_err(|e| PipelineError::Image {
        message: format!("Failed to build request body: {e}"),
    })
}

/// Decode a `DetectText` response into detections, preserving order.
///
/// A missing or null `TextDetections` field means no text was found.
pub fn decode_detections(body: &[u8]) -> Result<Vec<TextDetection>, PipelineError> {
    let response: DetectTextResponse =
        serde_json::from_slice(body).map_err(|e| PipelineError::Decode {
            message: format!("Failed to parse DetectText response: {e}"),
        })?;

    Ok(response
        .text_detections
        .unwrap_or_default()
        .into_iter()
        .map(|raw| TextDetection::new(raw.detected_text, raw.kind, raw.confidence))
        .collect())
}

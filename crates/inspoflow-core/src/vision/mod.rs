//! OCR provider integration.
//!
//! - **resize**: decode, fit into the bounding box, re-encode as JPEG
//! - **wire**: `DetectText` request/response bodies
//! - **client**: signs and sends requests, reports in-flight status

pub mod client;
pub mod resize;
pub mod wire;

pub use client::{AnalysisStatus, VisionClient};
pub use wire::decode_detections;

//! InspoFlow Core - screenshot analysis pipeline.
//!
//! Takes a screenshot, has a cloud OCR provider read the text off it, and
//! turns the detections into a title, summary, category and link. Analyses
//! can then be saved to a row store with the screenshot uploaded alongside.
//!
//! # Architecture
//!
//! ```text
//! Image → Resize/JPEG → Sign (SigV4) → DetectText → Classify → AnalysisResult
//!                                                                 ↓
//!                                     DuplicateGuard → Upload → Save item
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use inspoflow_core::{Config, VisionClient};
//!
//! #[tokio::main]
//! async fn main() -> inspoflow_core::Result<()> {
//!     let config = Config::load()?;
//!     let client = VisionClient::from_config(&config.vision)?;
//!
//!     let bytes = std::fs::read("./screenshot.png")?;
//!     let result = client.analyze(&bytes).await?;
//!     println!("{}: {}", result.title, result.summary);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod classify;
pub mod config;
pub mod error;
pub mod ingest;
pub mod retry;
pub mod signing;
pub mod storage;
pub mod tags;
pub mod types;
pub mod vision;

// Re-exports for convenient access
pub use classify::TextClassifier;
pub use config::Config;
pub use error::{
    ConfigError, InspoError, PipelineError, PipelineResult, Result, ServiceErrorKind, StorageError,
};
pub use ingest::{IngestOutcome, Ingestor};
pub use signing::{Credentials, RequestSigner, SignedRequest};
pub use storage::{
    DuplicateCheck, DuplicateGuard, ItemStore, MediaStore, MemoryStore, RestStore,
};
pub use tags::CanonicalTagValue;
pub use types::{AnalysisResult, Category, DetectionKind, ItemType, SavedItem, TextDetection};
pub use vision::{AnalysisStatus, VisionClient};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

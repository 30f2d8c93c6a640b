//! Core data types for the InspoFlow pipeline.
//!
//! `TextDetection` is the provider's raw output, `AnalysisResult` is what the
//! classifier hands back to the caller, and `SavedItem` is the row the
//! storage collaborator persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;

/// Granularity of a detection: a whole line of text or a single word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectionKind {
    Line,
    Word,
}

/// One piece of text found in an image by the OCR provider.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDetection {
    /// The recognized text
    pub text: String,

    /// Line or word
    pub kind: DetectionKind,

    /// Provider certainty, nominally 0.0 to 100.0
    pub confidence: f32,
}

impl TextDetection {
    pub fn new(text: impl Into<String>, kind: DetectionKind, confidence: f32) -> Self {
        Self {
            text: text.into(),
            kind,
            confidence,
        }
    }

    /// Shorthand for a `LINE` detection.
    pub fn line(text: impl Into<String>, confidence: f32) -> Self {
        Self::new(text, DetectionKind::Line, confidence)
    }

    /// Shorthand for a `WORD` detection.
    pub fn word(text: impl Into<String>, confidence: f32) -> Self {
        Self::new(text, DetectionKind::Word, confidence)
    }

    /// Confidence used for filtering: out-of-range values (and NaN) count as 0.
    pub fn effective_confidence(&self) -> f32 {
        if (0.0..=100.0).contains(&self.confidence) {
            self.confidence
        } else {
            0.0
        }
    }
}

/// What kind of thing the screenshot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Website,
    App,
    Error,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Website => "website",
            Category::App => "app",
            Category::Error => "error",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured metadata extracted from one screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Never empty
    pub title: String,

    /// At most 500 characters
    pub summary: String,

    pub category: Category,

    /// Ordered, unique, non-empty
    #[serde(default)]
    pub tags: Vec<String>,

    /// Absolute http(s) link found in the screenshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl AnalysisResult {
    /// A `category: error` result carrying a user-facing explanation.
    ///
    /// Lets a UI show something for a failed analysis without inspecting
    /// the error itself.
    pub fn failed(error: &PipelineError) -> Self {
        let title = match error {
            PipelineError::Network { .. } => "Connection Error",
            PipelineError::Service { .. } => "Service Error",
            PipelineError::Decode { .. } => "Unreadable Response",
            PipelineError::Signing { .. } | PipelineError::Image { .. } => "Error",
        };
        Self {
            title: title.to_string(),
            summary: error.user_message().to_string(),
            category: Category::Error,
            tags: Vec::new(),
            url: None,
        }
    }
}

/// Persisted item type (the `type` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    Website,
    App,
    Other,
}

impl ItemType {
    /// Map an analysis category onto a stored item type.
    ///
    /// Anything whose name mentions "app" is an app; everything else is
    /// filed as a website.
    pub fn from_category(category: Category) -> Self {
        if category.as_str().contains("app") {
            ItemType::App
        } else {
            ItemType::Website
        }
    }

    /// Parse the stored column value, defaulting to `Website`.
    pub fn parse(value: &str) -> Self {
        match value {
            "app" => ItemType::App,
            "other" => ItemType::Other,
            _ => ItemType::Website,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Website => "website",
            ItemType::App => "app",
            ItemType::Other => "other",
        }
    }
}

/// A saved piece of inspiration, as stored by the row store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedItem {
    pub id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub created_at: DateTime<Utc>,

    pub item_type: ItemType,

    /// Public URL of the uploaded screenshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    pub tags: Vec<String>,
}

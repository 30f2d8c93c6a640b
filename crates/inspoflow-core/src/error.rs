//! Error types for the InspoFlow analysis pipeline.
//!
//! Errors are organized by stage (signing, transport, provider response,
//! storage) so callers can decide what to retry and what to show the user.

use thiserror::Error;

/// Top-level error type for InspoFlow operations.
#[derive(Error, Debug)]
pub enum InspoError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Vision pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Storage collaborator errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A credential is unset (empty, or its `${ENV_VAR}` is not exported)
    #[error("{field} is not set. Set {hint}.")]
    MissingCredential { field: String, hint: String },
}

/// Errors from the sign → send → decode stages of an analysis call.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The request could not be signed (e.g. the endpoint host is unparseable)
    #[error("Signing error: {message}")]
    Signing { message: String },

    /// Transport failure: connection refused, DNS, TLS, timeout
    #[error("Network error: {message}")]
    Network { message: String },

    /// The provider answered with a non-2xx status
    #[error("Service returned HTTP {status}: {body}")]
    Service { status: u16, body: String },

    /// The provider's response did not match the expected schema
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// The input image could not be decoded, resized or re-encoded
    #[error("Image error: {message}")]
    Image { message: String },
}

/// Coarse classification of a provider's non-2xx status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// 404
    NotFound,
    /// 429 and 5xx: worth trying again later
    Unavailable,
    /// Everything else (auth, bad request, ...)
    Generic,
}

impl ServiceErrorKind {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            429 | 500..=599 => Self::Unavailable,
            _ => Self::Generic,
        }
    }
}

impl PipelineError {
    /// Classification of a `Service` error, `None` for other variants.
    pub fn service_kind(&self) -> Option<ServiceErrorKind> {
        match self {
            PipelineError::Service { status, .. } => Some(ServiceErrorKind::from_status(*status)),
            _ => None,
        }
    }

    /// Short human-readable message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::Network { .. } => "Could not reach the AI service.",
            PipelineError::Service { .. } => match self.service_kind() {
                Some(ServiceErrorKind::NotFound) => "The AI service endpoint was not found.",
                Some(ServiceErrorKind::Unavailable) => {
                    "The AI service is temporarily unavailable. Try again shortly."
                }
                _ => "The AI service returned an error.",
            },
            PipelineError::Decode { .. } => "Could not understand the AI service response.",
            PipelineError::Signing { .. } => "The AI service request could not be signed.",
            PipelineError::Image { .. } => "Failed to process image.",
        }
    }
}

/// Errors from the storage collaborator (row store and object storage).
#[derive(Error, Debug)]
pub enum StorageError {
    /// Transport failure
    #[error("Storage network error: {message}")]
    Network { message: String },

    /// Non-2xx response from the store
    #[error("Storage returned HTTP {status}: {body}")]
    Service { status: u16, body: String },

    /// Response body did not match the expected row schema
    #[error("Storage decode error: {message}")]
    Decode { message: String },

    /// The configured base URL or a derived endpoint is not a valid URL
    #[error("Invalid storage endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Convenience type alias for InspoFlow results.
pub type Result<T> = std::result::Result<T, InspoError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

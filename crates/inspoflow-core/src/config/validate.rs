//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.vision.region.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "vision.region must not be empty".into(),
            ));
        }
        if self.vision.service.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "vision.service must not be empty".into(),
            ));
        }
        if self.vision.max_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "vision.max_dimension must be > 0".into(),
            ));
        }
        if self.vision.jpeg_quality == 0 || self.vision.jpeg_quality > 100 {
            return Err(ConfigError::ValidationError(
                "vision.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.vision.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "vision.timeout_ms must be > 0".into(),
            ));
        }
        if self.storage.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "storage.timeout_ms must be > 0".into(),
            ));
        }
        if self.storage.table.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.table must not be empty".into(),
            ));
        }
        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.bucket must not be empty".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}

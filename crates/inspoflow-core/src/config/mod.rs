//! Configuration management for InspoFlow.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Secrets are usually written as `${ENV_VAR}` references and
//! resolved when a client is constructed.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for InspoFlow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OCR provider settings
    pub vision: VisionConfig,

    /// Storage collaborator settings
    pub storage: StorageConfig,

    /// Caller-side retry settings
    pub pipeline: PipelineConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path (with ~ expansion).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path.to_string_lossy();
        let expanded = PathBuf::from(shellexpand::tilde(&path_str).into_owned());
        let content = std::fs::read_to_string(&expanded)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.inspoflow.inspoflow/config.toml
    /// - Linux: ~/.config/inspoflow/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\inspoflow\config\config.toml
    ///
    /// Falls back to ~/.inspoflow/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "inspoflow", "inspoflow")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".inspoflow").join("config.toml")
            })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Resolve a credential field, failing with a hint naming what to set.
pub fn require_credential(value: &str, field: &str) -> Result<String, ConfigError> {
    resolve_env_var(value).ok_or_else(|| {
        let hint = match value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
            Some(var) => format!("the {var} env var"),
            None => format!("{field} in the config file"),
        };
        ConfigError::MissingCredential {
            field: field.to_string(),
            hint,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.vision.region, "us-east-1");
        assert_eq!(config.vision.max_dimension, 1024);
        assert_eq!(config.vision.jpeg_quality, 80);
        assert_eq!(config.storage.table, "saved_items");
        assert_eq!(config.storage.bucket, "screenshots");
    }

    #[test]
    fn test_default_endpoint_url() {
        let config = VisionConfig::default();
        assert_eq!(
            config.endpoint_url(),
            "https://rekognition.us-east-1.amazonaws.com/"
        );
    }

    #[test]
    fn test_endpoint_override() {
        let config = VisionConfig {
            endpoint: Some("http://127.0.0.1:9000/".to_string()),
            ..VisionConfig::default()
        };
        assert_eq!(config.endpoint_url(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[vision]"));
        assert!(toml.contains("[storage]"));
        assert!(!toml.contains("endpoint ="));
    }

    #[test]
    fn test_load_from_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[vision]\nregion = \"eu-west-1\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.vision.region, "eu-west-1");
        assert_eq!(config.vision.service, "rekognition");
        assert_eq!(config.pipeline.retry_attempts, 2);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[vision]\nmax_dimension = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_load_from_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[vision\nregion = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);

        std::env::set_var("INSPOFLOW_TEST_RESOLVE_KEY", "from-env");
        assert_eq!(
            resolve_env_var("${INSPOFLOW_TEST_RESOLVE_KEY}"),
            Some("from-env".to_string())
        );
    }

    #[test]
    fn test_require_credential_names_env_var() {
        let err = require_credential("${DEFINITELY_NOT_SET_XYZ_456}", "vision.secret_key")
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("vision.secret_key"));
        assert!(text.contains("DEFINITELY_NOT_SET_XYZ_456"));
    }
}

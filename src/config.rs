//! Model configuration.
//!
//! The model list lives in an external JSON document maintained alongside
//! other tooling config; this module owns its shape and loading, nothing
//! else. Which model a request uses is decided by the enhancement service.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Display name of the distinguished default model.
pub const DEFAULT_MODEL_LABEL: &str = "Claude.Code";

/// Environment variable overriding the model configuration path.
pub const AI_CONFIG_ENV: &str = "PROMPTMEM_AI_CONFIG";

/// The two supported provider families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI-compatible request shaping.
    OpenAi,
    /// Anthropic-compatible request shaping.
    Anthropic,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        };
        f.write_str(s)
    }
}

/// One configured model.
///
/// Read-only for the lifetime of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Human-facing display name.
    pub model_display_name: String,
    /// Provider's model identifier.
    pub model: String,
    /// Provider API base URL.
    pub base_url: String,
    /// API key for the provider.
    pub api_key: String,
    /// Provider family.
    pub provider: Provider,
}

/// The model configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiConfig {
    /// Configured models, in priority order.
    #[serde(default)]
    pub custom_models: Vec<ModelConfig>,
}

impl AiConfig {
    /// Loads the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] when the file cannot be read or
    /// parsed. Unlike pattern files, a broken model configuration is fatal:
    /// nothing downstream can run without it.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_ai_config".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        serde_json::from_str(&data).map_err(|e| Error::OperationFailed {
            operation: "parse_ai_config".to_string(),
            cause: format!("{}: {e}", path.display()),
        })
    }

    /// Loads the configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] when the file cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        Self::load_from_file(&Self::default_path())
    }

    /// Default configuration path.
    ///
    /// Resolves `PROMPTMEM_AI_CONFIG`, then `~/.factory/config.json`, then
    /// `./.factory/config.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(AI_CONFIG_ENV) {
            return PathBuf::from(path);
        }
        directories::BaseDirs::new().map_or_else(
            || PathBuf::from(".factory/config.json"),
            |base| base.home_dir().join(".factory").join("config.json"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "custom_models": [
            {
                "model_display_name": "Claude.Code",
                "model": "claude-sonnet-4-20250514",
                "base_url": "https://api.anthropic.com",
                "api_key": "sk-ant-test",
                "provider": "anthropic"
            },
            {
                "model_display_name": "GPT-4o",
                "model": "gpt-4o",
                "base_url": "https://api.openai.com/v1",
                "api_key": "sk-test",
                "provider": "openai"
            }
        ]
    }"#;

    #[test]
    fn test_parses_custom_models() {
        let config: AiConfig = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.custom_models.len(), 2);
        assert_eq!(config.custom_models[0].provider, Provider::Anthropic);
        assert_eq!(config.custom_models[0].model_display_name, DEFAULT_MODEL_LABEL);
        assert_eq!(config.custom_models[1].provider, Provider::OpenAi);
    }

    #[test]
    fn test_missing_models_list_defaults_empty() {
        let config: AiConfig = serde_json::from_str("{}").unwrap();
        assert!(config.custom_models.is_empty());
    }

    #[test]
    fn test_unknown_provider_is_a_parse_error() {
        let result: std::result::Result<Provider, _> = serde_json::from_str(r#""gemini""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(Provider::OpenAi.to_string(), "openai");
        assert_eq!(Provider::Anthropic.to_string(), "anthropic");
    }

    #[test]
    fn test_load_from_missing_file_is_operation_failed() {
        let err = AiConfig::load_from_file(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, Error::OperationFailed { .. }));
    }
}

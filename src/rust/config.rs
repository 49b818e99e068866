//! File-based engine configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::classifier::tokenizer::{MAX_SEQUENCE_LENGTH, VOCAB_SIZE};
use crate::model_manager::{ModelError, LABELS_FILE_NAME, MODEL_FILE_NAME};
use crate::runtime::RuntimeConfig;

/// Settings read from a JSON file; every field is optional.
///
/// ```json
/// {
///   "model_dir": "models",
///   "max_len": 20,
///   "extra_emergency_keywords": ["mayday", "red alert"],
///   "model_sha256": "..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory holding the artifacts; resolved by `ModelManager` when unset.
    pub model_dir: Option<PathBuf>,
    pub model_file: String,
    pub labels_file: String,
    /// Switches to the subword encoder when set (relative to `model_dir`).
    pub tokenizer_file: Option<String>,
    pub max_len: usize,
    pub vocab_size: u32,
    /// Added to the built-in emergency keyword list; never replaces it.
    pub extra_emergency_keywords: Vec<String>,
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub model_sha256: Option<String>,
    pub labels_sha256: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            model_file: MODEL_FILE_NAME.to_string(),
            labels_file: LABELS_FILE_NAME.to_string(),
            tokenizer_file: None,
            max_len: MAX_SEQUENCE_LENGTH,
            vocab_size: VOCAB_SIZE,
            extra_emergency_keywords: Vec::new(),
            inter_threads: 0,
            intra_threads: 0,
            model_sha256: None,
            labels_sha256: None,
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::ArtifactMissing(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ModelError> {
        let config: Self = serde_json::from_str(raw)?;
        if config.max_len == 0 {
            return Err(ModelError::ConfigError("max_len must be greater than zero".into()));
        }
        if config.vocab_size == 0 {
            return Err(ModelError::ConfigError("vocab_size must be greater than zero".into()));
        }
        Ok(config)
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            ..RuntimeConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_len, 20);
        assert_eq!(config.vocab_size, 30_000);
        assert_eq!(config.model_file, "intent_classifier.onnx");
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_json_str(
            r#"{"model_dir": "/opt/habitat", "extra_emergency_keywords": ["mayday"], "intra_threads": 2}"#,
        )
        .unwrap();
        assert_eq!(config.model_dir, Some(PathBuf::from("/opt/habitat")));
        assert_eq!(config.extra_emergency_keywords, vec!["mayday".to_string()]);
        assert_eq!(config.runtime_config().intra_threads, 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"max_len": 0}"#),
            Err(ModelError::ConfigError(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"max_length": 20}"#),
            Err(ModelError::JsonError(_))
        ));
    }
}

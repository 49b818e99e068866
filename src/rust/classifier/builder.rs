use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info, warn};

use super::binding::InputBinder;
use super::classifier::Classifier;
use super::emergency::EmergencyMatcher;
use super::engine::{InferenceBackend, OnnxEngine};
use super::error::ClassifierError;
use super::labels::LabelMap;
use super::tokenizer::{HashTokenizer, SubwordEncoder, TextEncoder, MAX_SEQUENCE_LENGTH, VOCAB_SIZE};
use crate::config::EngineConfig;
use crate::model_manager::ModelManager;
use crate::runtime::RuntimeConfig;

/// A builder for constructing a Classifier with a fluent interface.
///
/// Nothing is loaded until [`ClassifierBuilder::build`], which either returns a
/// fully initialised classifier or the first startup error.
#[derive(Debug)]
pub struct ClassifierBuilder {
    model_dir: Option<PathBuf>,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    labels: Option<LabelMap>,
    tokenizer_path: Option<PathBuf>,
    max_len: usize,
    vocab_size: u32,
    extra_emergency_keywords: Vec<String>,
    backend: Option<Arc<dyn InferenceBackend>>,
    model_sha256: Option<String>,
    labels_sha256: Option<String>,
    runtime_config: RuntimeConfig,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    /// Creates a new builder with the default hash tokenizer settings
    pub fn new() -> Self {
        Self {
            model_dir: None,
            model_path: None,
            labels_path: None,
            labels: None,
            tokenizer_path: None,
            max_len: MAX_SEQUENCE_LENGTH,
            vocab_size: VOCAB_SIZE,
            extra_emergency_keywords: Vec::new(),
            backend: None,
            model_sha256: None,
            labels_sha256: None,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Applies every setting from a file-based configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut builder = Self::new().with_runtime_config(config.runtime_config());
        let dir = config
            .model_dir
            .clone()
            .unwrap_or_else(ModelManager::get_default_models_dir);

        builder.model_path = Some(dir.join(&config.model_file));
        builder.labels_path = Some(dir.join(&config.labels_file));
        builder.tokenizer_path = config.tokenizer_file.as_ref().map(|file| dir.join(file));
        builder.model_dir = Some(dir);
        builder.max_len = config.max_len;
        builder.vocab_size = config.vocab_size;
        builder.extra_emergency_keywords = config.extra_emergency_keywords.clone();
        builder.model_sha256 = config.model_sha256.clone();
        builder.labels_sha256 = config.labels_sha256.clone();
        builder
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Reads `intent_classifier.onnx` and `label_maps.json` from `dir`
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    /// Overrides the model artifact location
    pub fn with_model_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Overrides the label table location
    pub fn with_labels_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.labels_path = Some(path.into());
        self
    }

    /// Uses an already loaded label table instead of reading one from disk
    pub fn with_labels(mut self, labels: LabelMap) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Replaces the hash tokenizer with a subword tokenizer definition
    pub fn with_subword_tokenizer(mut self, path: impl Into<PathBuf>) -> Self {
        self.tokenizer_path = Some(path.into());
        self
    }

    pub fn with_sequence_length(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_vocab_size(mut self, vocab_size: u32) -> Self {
        self.vocab_size = vocab_size;
        self
    }

    /// Adds keywords to the built-in emergency list, which always stays active
    pub fn with_extra_emergency_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_emergency_keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    /// Uses a custom inference backend instead of loading an ONNX artifact
    pub fn with_backend<B: InferenceBackend + 'static>(mut self, backend: B) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Requires the model artifact to match a SHA-256 digest
    pub fn with_model_digest(mut self, sha256: impl Into<String>) -> Self {
        self.model_sha256 = Some(sha256.into());
        self
    }

    /// Requires the label table to match a SHA-256 digest
    pub fn with_labels_digest(mut self, sha256: impl Into<String>) -> Self {
        self.labels_sha256 = Some(sha256.into());
        self
    }

    /// Loads and validates every component and returns the ready classifier
    ///
    /// # Errors
    /// - `ConfigError` if the label table, keywords, tokenizer settings or label digest are invalid
    /// - `ModelLoadError` if no model is configured, or the artifact is missing, corrupt or fails its digest
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        let manager = ModelManager::new(
            self.model_dir
                .clone()
                .unwrap_or_else(ModelManager::get_default_models_dir),
        );

        let labels = match self.labels {
            Some(labels) => labels,
            None => {
                let path = self.labels_path.clone().unwrap_or_else(|| manager.get_labels_path());
                if let Some(digest) = &self.labels_sha256 {
                    manager
                        .verify_file(&path, digest)
                        .map_err(|e| ClassifierError::ConfigError(e.to_string()))?;
                }
                LabelMap::load(&path).map_err(|e| {
                    error!("Failed to load label table: {}", e);
                    e
                })?
            }
        };

        let matcher = EmergencyMatcher::with_additional_keywords(&self.extra_emergency_keywords)?;

        let encoder: Arc<dyn TextEncoder> = match &self.tokenizer_path {
            Some(path) => Arc::new(SubwordEncoder::from_file(path, self.max_len)?),
            None => Arc::new(HashTokenizer::new(self.max_len, self.vocab_size)?),
        };

        let engine: Arc<dyn InferenceBackend> = match self.backend {
            Some(backend) => backend,
            None => {
                let path = self.model_path.clone().unwrap_or_else(|| manager.get_model_path());
                if let Some(digest) = &self.model_sha256 {
                    manager.verify_file(&path, digest)?;
                }
                Arc::new(OnnxEngine::load(&path, &self.runtime_config).map_err(|e| {
                    error!("Failed to load model: {}", e);
                    e
                })?)
            }
        };

        let binder = InputBinder;
        match binder.plan(engine.declared_inputs()) {
            Ok(plan) => info!("Input binding plan: {:?}", plan),
            Err(e) => warn!("Model inputs cannot be fully bound; every inference call will fail: {}", e),
        }

        info!("Classifier ready with {} labels", labels.len());
        Ok(Classifier {
            labels: Arc::new(labels),
            matcher,
            encoder,
            binder,
            engine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::binding::{BoundInputs, ModelInputSpec};

    #[derive(Debug)]
    struct FixedScores {
        inputs: Vec<ModelInputSpec>,
    }

    impl InferenceBackend for FixedScores {
        fn declared_inputs(&self) -> &[ModelInputSpec] {
            &self.inputs
        }

        fn run(&self, _inputs: &BoundInputs) -> Result<Vec<f32>, ClassifierError> {
            Ok(vec![0.2, 0.8])
        }
    }

    fn backend() -> FixedScores {
        FixedScores {
            inputs: vec![ModelInputSpec::new("input_ids")],
        }
    }

    fn labels() -> LabelMap {
        LabelMap::from_pairs([("lights_on", 0), ("lights_off", 1)]).unwrap()
    }

    #[test]
    fn test_missing_model_fails_closed() {
        let result = ClassifierBuilder::new()
            .with_labels(labels())
            .with_model_file("/nonexistent/intent_classifier.onnx")
            .build();
        assert!(matches!(result, Err(ClassifierError::ModelLoadError(_))));
    }

    #[test]
    fn test_missing_labels_is_config_error() {
        let result = ClassifierBuilder::new()
            .with_labels_file("/nonexistent/label_maps.json")
            .with_backend(backend())
            .build();
        assert!(matches!(result, Err(ClassifierError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let result = ClassifierBuilder::new()
            .with_labels(labels())
            .with_backend(backend())
            .with_sequence_length(0)
            .build();
        assert!(matches!(result, Err(ClassifierError::ConfigError(_))));

        let result = ClassifierBuilder::new()
            .with_labels(labels())
            .with_backend(backend())
            .with_extra_emergency_keywords([""])
            .build();
        assert!(matches!(result, Err(ClassifierError::ConfigError(_))));
    }

    #[test]
    fn test_build_with_backend() {
        let classifier = ClassifierBuilder::new()
            .with_labels(labels())
            .with_backend(backend())
            .build()
            .unwrap();
        let info = classifier.info();
        assert_eq!(info.num_classes, 2);
        assert_eq!(info.input_names, vec!["input_ids".to_string()]);
        assert_eq!(info.max_sequence_length, 20);
        assert_eq!(classifier.classify_label("lights off please").unwrap(), "lights_off");
    }

    #[test]
    fn test_extra_keywords_keep_builtin_list() {
        let config = EngineConfig::from_json_str(r#"{"extra_emergency_keywords": ["mayday"]}"#).unwrap();
        let classifier = ClassifierBuilder::from_config(&config)
            .with_labels(labels())
            .with_backend(backend())
            .build()
            .unwrap();

        let result = classifier.classify("There is a fire in module 3").unwrap();
        assert_eq!(result.resolved_label, "emergency");
        assert!(result.matched_emergency && result.scores.is_empty());
        assert_eq!(classifier.classify_label("mayday mayday").unwrap(), "emergency");
        assert_eq!(classifier.classify_label("lights off please").unwrap(), "lights_off");
    }

    #[test]
    fn test_from_config_resolves_paths() {
        let config = EngineConfig {
            model_dir: Some(PathBuf::from("/srv/models")),
            tokenizer_file: Some("tokenizer.json".into()),
            ..EngineConfig::default()
        };
        let builder = ClassifierBuilder::from_config(&config);
        assert_eq!(builder.model_path, Some(PathBuf::from("/srv/models/intent_classifier.onnx")));
        assert_eq!(builder.labels_path, Some(PathBuf::from("/srv/models/label_maps.json")));
        assert_eq!(builder.tokenizer_path, Some(PathBuf::from("/srv/models/tokenizer.json")));
    }
}

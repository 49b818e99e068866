use std::collections::BTreeSet;

use ort::Error as OrtError;

use crate::model_manager::ModelError;

/// Represents the different types of errors that can occur while loading or
/// running the intent classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The label table or engine configuration is missing or malformed
    #[error("Config error: {0}")]
    ConfigError(String),
    /// The model artifact is missing, unreadable or structurally unusable
    #[error("Model load error: {0}")]
    ModelLoadError(String),
    /// One or more required model inputs have no binding rule
    #[error("Unbound model inputs: {}", format_names(.missing))]
    UnboundInputError { missing: BTreeSet<String> },
    /// The inference backend rejected the bound tensors
    #[error("Inference error: {0}")]
    InferenceError(String),
    /// Error occurred while running a subword tokenizer
    #[error("Tokenizer error: {0}")]
    TokenizerError(String),
}

impl ClassifierError {
    /// Returns true for errors that can only be raised while building the classifier.
    pub fn is_startup_error(&self) -> bool {
        matches!(self, Self::ConfigError(_) | Self::ModelLoadError(_))
    }
}

fn format_names(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ModelLoadError(err.to_string())
    }
}

impl From<ModelError> for ClassifierError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ArtifactMissing(_) | ModelError::IoError(_) | ModelError::HashMismatch { .. } => {
                ClassifierError::ModelLoadError(err.to_string())
            }
            ModelError::ConfigError(_) | ModelError::JsonError(_) => {
                ClassifierError::ConfigError(err.to_string())
            }
        }
    }
}

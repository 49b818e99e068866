mod error;
pub mod binding;
pub mod builder;
#[allow(clippy::module_inception)]
mod classifier;
pub mod emergency;
pub mod engine;
pub mod labels;
pub mod tokenizer;

pub use binding::{BoundInputs, BoundTensor, InputBinder, InputDType, InputRole, ModelInputSpec};
pub use builder::ClassifierBuilder;
pub use classifier::{Classification, Classifier};
pub use emergency::{EmergencyMatcher, DEFAULT_EMERGENCY_KEYWORDS, EMERGENCY_LABEL};
pub use engine::{InferenceBackend, OnnxEngine};
pub use error::ClassifierError;
pub use labels::{LabelMap, UNKNOWN_LABEL};
pub use tokenizer::{stable_hash, AttentionMask, HashTokenizer, SubwordEncoder, TextEncoder, TokenSequence};

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Number of labels in the label table
    pub num_classes: usize,
    /// Labels in class index order
    pub class_labels: Vec<String>,
    /// Input names the model declares
    pub input_names: Vec<String>,
    /// Length every token sequence is padded or truncated to
    pub max_sequence_length: usize,
    /// Keywords that trigger the emergency override
    pub emergency_keywords: Vec<String>,
}

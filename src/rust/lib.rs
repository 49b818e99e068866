//! Intent classification for habitat console commands.
//!
//! Free-text crew commands are mapped onto the intents of a pre-trained
//! sequence-classification model. A keyword override sits in front of the
//! model: any text mentioning an emergency is labelled `"emergency"` without
//! ever reaching inference.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use astroassist::Classifier;
//!
//! let classifier = Classifier::builder()
//!     .with_model_dir("models")
//!     .build()?;
//!
//! let result = classifier.classify("There is a fire in module 3")?;
//! assert_eq!(result.resolved_label, "emergency");
//!
//! let label = classifier.classify_label("open airlock two")?;
//! println!("Intent: {}", label);
//! # Ok(())
//! # }
//! ```
//!
//! # Preprocessing
//!
//! Text is encoded by [`HashTokenizer`]: whitespace words are hashed with
//! [`stable_hash`] into a 30000-id space and padded to 20 positions. The hash
//! is reproducible across processes so ids match what the model was calibrated
//! against.
//!
//! # Thread Safety
//!
//! A built [`Classifier`] is immutable and `Send + Sync`; wrap it in `Arc` and
//! share it between request handlers.

pub mod classifier;
pub mod config;
pub mod model_manager;
mod runtime;

pub use classifier::{
    stable_hash, AttentionMask, BoundInputs, BoundTensor, Classification, Classifier, ClassifierBuilder,
    ClassifierError, ClassifierInfo, EmergencyMatcher, HashTokenizer, InferenceBackend, InputBinder,
    InputDType, InputRole, LabelMap, ModelInputSpec, OnnxEngine, SubwordEncoder, TextEncoder, TokenSequence,
    DEFAULT_EMERGENCY_KEYWORDS, EMERGENCY_LABEL, UNKNOWN_LABEL,
};
pub use config::EngineConfig;
pub use model_manager::{ModelError, ModelManager};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}

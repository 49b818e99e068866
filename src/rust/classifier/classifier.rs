use std::sync::Arc;

use log::{debug, warn};

use super::binding::InputBinder;
use super::emergency::{EmergencyMatcher, EMERGENCY_LABEL};
use super::engine::InferenceBackend;
use super::error::ClassifierError;
use super::labels::LabelMap;
use super::tokenizer::TextEncoder;

/// Outcome of classifying one command.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub input_text: String,
    pub resolved_label: String,
    pub matched_emergency: bool,
    /// Arg-max class index; `None` when the emergency override fired.
    pub predicted_index: Option<usize>,
    /// Raw model scores; empty when the emergency override fired.
    pub scores: Vec<f32>,
}

/// Intent classifier with a keyword safety override in front of the model.
///
/// # Thread Safety
///
/// Every field is immutable after [`ClassifierBuilder::build`](super::ClassifierBuilder::build)
/// and shared through `Arc`, so one instance can serve concurrent callers.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use astroassist::Classifier;
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(Classifier::builder()
///     .with_model_dir("models")
///     .build()?);
///
/// let classifier_clone = Arc::clone(&classifier);
/// thread::spawn(move || {
///     classifier_clone.classify("There is a fire in module 3").unwrap();
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    pub(crate) labels: Arc<LabelMap>,
    pub(crate) matcher: EmergencyMatcher,
    pub(crate) encoder: Arc<dyn TextEncoder>,
    pub(crate) binder: InputBinder,
    pub(crate) engine: Arc<dyn InferenceBackend>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            num_classes: self.labels.len(),
            class_labels: self.labels.labels(),
            input_names: self
                .engine
                .declared_inputs()
                .iter()
                .map(|spec| spec.name.clone())
                .collect(),
            max_sequence_length: self.encoder.max_len(),
            emergency_keywords: self.matcher.keywords().to_vec(),
        }
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Classifies a crew command.
    ///
    /// Emergency keywords short-circuit to `"emergency"` before any tokenizing
    /// or inference happens. Otherwise the model's arg-max index is resolved
    /// through the label table, with unassigned indices reported as `"unknown"`.
    ///
    /// # Errors
    /// - `UnboundInputError` if the model declares inputs that cannot be fed
    /// - `InferenceError` if the backend rejects the inputs or returns no usable scores
    /// - `TokenizerError` if a subword encoder fails
    pub fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        if let Some(keyword) = self.matcher.matched_keyword(text) {
            warn!("Emergency override triggered by '{}'", keyword);
            return Ok(Classification {
                input_text: text.to_string(),
                resolved_label: EMERGENCY_LABEL.to_string(),
                matched_emergency: true,
                predicted_index: None,
                scores: Vec::new(),
            });
        }

        let (ids, mask) = self.encoder.encode(text)?;
        let bound = self.binder.bind(&ids, &mask, self.engine.declared_inputs())?;
        let scores = self.engine.run(&bound)?;

        if scores.len() != self.labels.len() {
            debug!(
                "Model returned {} scores for {} labels",
                scores.len(),
                self.labels.len()
            );
        }

        let index = argmax(&scores).ok_or_else(|| {
            ClassifierError::InferenceError("Model returned no usable class scores".into())
        })?;
        let label = self.labels.resolve(index).to_string();
        debug!("Classified {:?} as '{}' (index {})", text, label, index);

        Ok(Classification {
            input_text: text.to_string(),
            resolved_label: label,
            matched_emergency: false,
            predicted_index: Some(index),
            scores,
        })
    }

    /// Label-only form of [`Classifier::classify`].
    pub fn classify_label(&self, text: &str) -> Result<String, ClassifierError> {
        self.classify(text).map(|c| c.resolved_label)
    }
}

/// Index of the first maximal score, ignoring NaN.
pub(crate) fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((i, score)),
        })
        .map(|(i, _)| i)
}

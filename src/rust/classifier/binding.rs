//! Resolution of tokenizer output onto the input names a model declares.
//!
//! Every decision comes from a fixed rule table so the feed for a given model
//! can be inspected with [`InputBinder::plan`] before anything is run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::debug;
use ndarray::Array2;

use super::error::ClassifierError;
use super::tokenizer::{AttentionMask, TokenSequence};

/// Element type a model declares for one of its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputDType {
    Int64,
    Int32,
    Other(String),
}

/// One named input as exposed by the loaded model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInputSpec {
    pub name: String,
    /// Declared dimensions; negative values are dynamic axes.
    pub shape: Vec<i64>,
    pub dtype: InputDType,
    pub required: bool,
}

impl ModelInputSpec {
    /// A required `[batch, sequence]` int64 input with dynamic axes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: vec![-1, -1],
            dtype: InputDType::Int64,
            required: true,
        }
    }

    pub fn with_shape(mut self, shape: Vec<i64>) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_dtype(mut self, dtype: InputDType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// What a declared input gets fed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    TokenIds,
    AttentionMask,
    SegmentIds,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenIds => write!(f, "token ids"),
            Self::AttentionMask => write!(f, "attention mask"),
            Self::SegmentIds => write!(f, "segment ids"),
        }
    }
}

const BINDING_RULES: &[(&str, InputRole)] = &[
    ("input_ids", InputRole::TokenIds),
    ("attention_mask", InputRole::AttentionMask),
    ("attentionmask", InputRole::AttentionMask),
    ("token_type_ids", InputRole::SegmentIds),
];

/// A single `[1, len]` tensor ready for the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundTensor {
    pub role: InputRole,
    pub values: Array2<i64>,
}

/// Declared input name → tensor, one entry per bound input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundInputs {
    tensors: BTreeMap<String, BoundTensor>,
}

impl BoundInputs {
    pub fn get(&self, name: &str) -> Option<&BoundTensor> {
        self.tensors.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundTensor)> {
        self.tensors.iter().map(|(name, tensor)| (name.as_str(), tensor))
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, role: InputRole, values: Array2<i64>) {
        self.tensors.insert(name.into(), BoundTensor { role, values });
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputBinder;

impl InputBinder {
    /// Decides which role feeds each declared input, failing with every
    /// required name that no rule covers.
    pub fn plan(&self, declared: &[ModelInputSpec]) -> Result<Vec<(String, InputRole)>, ClassifierError> {
        let has_named_ids = declared.iter().any(|spec| spec.name == "input_ids");
        let sole_input = declared.len() == 1 && !has_named_ids;

        let mut plan = Vec::with_capacity(declared.len());
        let mut missing = BTreeSet::new();

        for spec in declared {
            let role = BINDING_RULES
                .iter()
                .find(|(name, _)| *name == spec.name)
                .map(|(_, role)| *role)
                .or(if sole_input { Some(InputRole::TokenIds) } else { None });

            match role {
                Some(role) => plan.push((spec.name.clone(), role)),
                None if spec.required => {
                    missing.insert(spec.name.clone());
                }
                None => debug!("Leaving optional input '{}' unbound", spec.name),
            }
        }

        if missing.is_empty() {
            Ok(plan)
        } else {
            Err(ClassifierError::UnboundInputError { missing })
        }
    }

    pub fn bind(
        &self,
        ids: &TokenSequence,
        mask: &AttentionMask,
        declared: &[ModelInputSpec],
    ) -> Result<BoundInputs, ClassifierError> {
        let plan = self.plan(declared)?;
        let mut bound = BoundInputs::default();

        for (name, role) in plan {
            let values = match role {
                InputRole::TokenIds => row(ids.as_slice()),
                InputRole::AttentionMask => row(mask.as_slice()),
                InputRole::SegmentIds => Array2::zeros((1, ids.len())),
            };
            debug!("Binding '{}' to {}", name, role);
            bound.insert(name, role, values);
        }

        Ok(bound)
    }
}

fn row(values: &[i64]) -> Array2<i64> {
    let mut out = Array2::zeros((1, values.len()));
    out.row_mut(0)
        .iter_mut()
        .zip(values)
        .for_each(|(slot, &v)| *slot = v);
    out
}

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use ndarray::Array2;
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{DynValue, Tensor, ValueType};

use super::binding::{BoundInputs, InputDType, ModelInputSpec};
use super::error::ClassifierError;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// A loaded sequence-classification model.
///
/// Implementations are read-only after construction and shared between
/// concurrent callers.
pub trait InferenceBackend: Debug + Send + Sync {
    /// Inputs the model declares, in declaration order.
    fn declared_inputs(&self) -> &[ModelInputSpec];

    /// Runs a forward pass and returns one raw score per class index.
    fn run(&self, inputs: &BoundInputs) -> Result<Vec<f32>, ClassifierError>;
}

/// ONNX Runtime backed [`InferenceBackend`].
#[derive(Debug)]
pub struct OnnxEngine {
    model_path: PathBuf,
    session: Session,
    inputs: Vec<ModelInputSpec>,
    output_name: String,
}

impl OnnxEngine {
    pub fn load<P: AsRef<Path>>(artifact_path: P, config: &RuntimeConfig) -> Result<Self, ClassifierError> {
        let model_path = artifact_path.as_ref();
        if !model_path.is_file() {
            return Err(ClassifierError::ModelLoadError(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let session = create_session_builder(config)?
            .commit_from_file(model_path)
            .map_err(|e| {
                ClassifierError::ModelLoadError(format!("Failed to load {}: {}", model_path.display(), e))
            })?;

        let inputs = Self::describe_inputs(&session);
        let output_name = Self::validate_model(&session)?;

        info!("Model loaded from {}", model_path.display());
        for spec in &inputs {
            info!("  input {} {:?} {:?}", spec.name, spec.shape, spec.dtype);
        }

        Ok(Self {
            model_path: model_path.to_path_buf(),
            session,
            inputs,
            output_name,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn describe_inputs(session: &Session) -> Vec<ModelInputSpec> {
        session
            .inputs
            .iter()
            .map(|input| {
                let (shape, dtype) = match &input.input_type {
                    ValueType::Tensor { ty, dimensions, .. } => {
                        let dtype = match ty {
                            TensorElementType::Int64 => InputDType::Int64,
                            TensorElementType::Int32 => InputDType::Int32,
                            other => InputDType::Other(format!("{:?}", other)),
                        };
                        (dimensions.clone(), dtype)
                    }
                    other => (Vec::new(), InputDType::Other(format!("{:?}", other))),
                };
                ModelInputSpec {
                    name: input.name.clone(),
                    shape,
                    dtype,
                    required: true,
                }
            })
            .collect()
    }

    /// Checks the model has at least one input and one output, returning the
    /// name of the score output.
    fn validate_model(session: &Session) -> Result<String, ClassifierError> {
        if session.inputs.is_empty() {
            return Err(ClassifierError::ModelLoadError("Model declares no inputs".into()));
        }
        let first = session
            .outputs
            .first()
            .ok_or_else(|| ClassifierError::ModelLoadError("Model must have at least 1 output for class scores".into()))?;
        if session.outputs.len() > 1 {
            warn!(
                "Model declares {} outputs; using '{}' as class scores",
                session.outputs.len(),
                first.name
            );
        }
        Ok(first.name.clone())
    }

    fn to_value(spec: &ModelInputSpec, values: &Array2<i64>) -> Result<DynValue, ClassifierError> {
        let to_err = |e: ort::Error| {
            ClassifierError::InferenceError(format!("Failed to create tensor for '{}': {}", spec.name, e))
        };
        match &spec.dtype {
            InputDType::Int64 => {
                let array = values.clone().into_dyn();
                let view = array.as_standard_layout();
                Ok(Tensor::from_array(&view).map_err(to_err)?.into_dyn())
            }
            InputDType::Int32 => {
                let array = values.mapv(|v| v as i32).into_dyn();
                let view = array.as_standard_layout();
                Ok(Tensor::from_array(&view).map_err(to_err)?.into_dyn())
            }
            InputDType::Other(ty) => Err(ClassifierError::InferenceError(format!(
                "Input '{}' expects {} but only integer tensors can be bound",
                spec.name, ty
            ))),
        }
    }
}

/// Rejects tensors whose rank or static dimensions disagree with the declaration.
pub fn check_shape(spec: &ModelInputSpec, actual: &[usize]) -> Result<(), ClassifierError> {
    let mismatch = || {
        ClassifierError::InferenceError(format!(
            "Input '{}' declared with shape {:?} but bound tensor has shape {:?}",
            spec.name, spec.shape, actual
        ))
    };
    if spec.shape.is_empty() {
        return Ok(());
    }
    if spec.shape.len() != actual.len() {
        return Err(mismatch());
    }
    for (&declared, &got) in spec.shape.iter().zip(actual) {
        if declared > 0 && declared as usize != got {
            return Err(mismatch());
        }
    }
    Ok(())
}

impl InferenceBackend for OnnxEngine {
    fn declared_inputs(&self) -> &[ModelInputSpec] {
        &self.inputs
    }

    fn run(&self, inputs: &BoundInputs) -> Result<Vec<f32>, ClassifierError> {
        let mut input_tensors: HashMap<String, DynValue> = HashMap::new();
        for spec in &self.inputs {
            let Some(bound) = inputs.get(&spec.name) else {
                continue;
            };
            check_shape(spec, bound.values.shape())?;
            input_tensors.insert(spec.name.clone(), Self::to_value(spec, &bound.values)?);
        }
        debug!("Running model with inputs {:?}", input_tensors.keys().collect::<Vec<_>>());

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::InferenceError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::InferenceError(format!("Failed to extract output tensor: {}", e)))?;

        Ok(output_tensor.iter().copied().collect())
    }
}

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use log::{info, warn};
use ndarray::Array2;
use ort::session::{Session, SessionInputValue};
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};

use super::error::ClassifierError;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Maps one padded token sequence to a vector of class scores.
///
/// Scores are only compared with each other; they need not be probabilities.
/// Implementations are shared read-only between concurrent requests.
pub trait ScoreModel: Send + Sync + fmt::Debug {
    fn infer(&self, padded: &[i64]) -> Result<Vec<f32>, ClassifierError>;

    /// Number of scores every call returns, when the model declares it up front
    fn num_classes(&self) -> Option<usize> {
        None
    }
}

/// Element type the exported graph expects for its token input.
///
/// Keras models converted with their default `Input` keep a float input even
/// though the values are token ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenInput {
    Float32,
    Int64,
    Int32,
}

/// A `[1, len]` batch holding one sequence, in the model's input type.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenBatch {
    Float32(Array2<f32>),
    Int64(Array2<i64>),
    Int32(Array2<i32>),
}

impl TokenInput {
    /// Picks the input type and checks the declared shape against `max_len`.
    ///
    /// Dynamic dimensions are reported as -1 and accepted.
    pub(crate) fn from_signature(
        ty: TensorElementType,
        dimensions: &[i64],
        max_len: usize,
    ) -> Result<Self, ClassifierError> {
        let input_type = match ty {
            TensorElementType::Float32 => Self::Float32,
            TensorElementType::Int64 => Self::Int64,
            TensorElementType::Int32 => Self::Int32,
            other => {
                return Err(ClassifierError::ModelError(format!(
                    "Unsupported input element type {:?}",
                    other
                )))
            }
        };

        if let Some(&seq_dim) = dimensions.get(1) {
            if seq_dim > 0 && seq_dim as usize != max_len {
                return Err(ClassifierError::ModelError(format!(
                    "Model expects sequences of {} tokens but the service pads to {}",
                    seq_dim, max_len
                )));
            }
        }

        Ok(input_type)
    }

    pub(crate) fn batch(self, padded: &[i64]) -> Result<TokenBatch, ClassifierError> {
        let shape = (1, padded.len());
        let shape_err = |e: ndarray::ShapeError| {
            ClassifierError::ModelError(format!("Failed to create input array: {}", e))
        };

        Ok(match self {
            Self::Float32 => TokenBatch::Float32(
                Array2::from_shape_vec(shape, padded.iter().map(|&x| x as f32).collect()).map_err(shape_err)?,
            ),
            Self::Int64 => TokenBatch::Int64(Array2::from_shape_vec(shape, padded.to_vec()).map_err(shape_err)?),
            Self::Int32 => {
                let ids = padded
                    .iter()
                    .map(|&x| i32::try_from(x))
                    .collect::<Result<Vec<i32>, _>>()
                    .map_err(|_| ClassifierError::ModelError("Token id does not fit the model's int32 input".into()))?;
                TokenBatch::Int32(Array2::from_shape_vec(shape, ids).map_err(shape_err)?)
            }
        })
    }
}

/// Class count from an output shape such as `[batch, classes]`, if fixed.
pub(crate) fn declared_classes(dimensions: &[i64]) -> Option<usize> {
    match dimensions.last() {
        Some(&dim) if dimensions.len() >= 2 && dim > 0 => Some(dim as usize),
        _ => None,
    }
}

/// The classifier artifact, executed by ONNX Runtime.
///
/// The model is expected to:
/// - Accept one input of shape [batch_size, sequence_length]
/// - Output scores of shape [batch_size, num_classes]
#[derive(Debug)]
pub struct OnnxModel {
    session: Session,
    input_name: String,
    input_type: TokenInput,
    num_classes: Option<usize>,
}

impl OnnxModel {
    /// Loads the model and checks that it can take sequences of `max_len` tokens.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        max_len: usize,
        runtime_config: &RuntimeConfig,
    ) -> Result<Self, ClassifierError> {
        let session = create_session_builder(runtime_config)?
            .commit_from_file(path.as_ref())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to load model {:?}: {}", path.as_ref(), e)))?;

        let (input_name, input_type, num_classes) = Self::validate_model(&session, max_len)?;
        info!(
            "Model loaded from {:?}: input '{}' ({:?}), {} output(s), classes {:?}",
            path.as_ref(),
            input_name,
            input_type,
            session.outputs.len(),
            num_classes
        );

        Ok(Self {
            session,
            input_name,
            input_type,
            num_classes,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(
        session: &Session,
        max_len: usize,
    ) -> Result<(String, TokenInput, Option<usize>), ClassifierError> {
        let input = session.inputs.first().ok_or_else(|| {
            ClassifierError::ModelError("Model must have at least 1 input for the token sequence".into())
        })?;
        if session.inputs.len() > 1 {
            warn!("Model declares {} inputs; only '{}' will be fed", session.inputs.len(), input.name);
        }
        let output = session.outputs.first().ok_or_else(|| {
            ClassifierError::ModelError("Model must have at least 1 output for class scores".into())
        })?;

        let input_type = match &input.input_type {
            ValueType::Tensor { ty, dimensions, .. } => TokenInput::from_signature(*ty, dimensions, max_len)?,
            other => {
                return Err(ClassifierError::ModelError(format!(
                    "Model input '{}' must be a tensor, found {:?}",
                    input.name, other
                )))
            }
        };

        let num_classes = match &output.output_type {
            ValueType::Tensor { dimensions, .. } => declared_classes(dimensions),
            _ => None,
        };

        Ok((input.name.clone(), input_type, num_classes))
    }
}

impl ScoreModel for OnnxModel {
    fn infer(&self, padded: &[i64]) -> Result<Vec<f32>, ClassifierError> {
        let value: SessionInputValue<'static> = match self.input_type.batch(padded)? {
            TokenBatch::Float32(array) => Tensor::from_array(array)?.into(),
            TokenBatch::Int64(array) => Tensor::from_array(array)?.into(),
            TokenBatch::Int32(array) => Tensor::from_array(array)?.into(),
        };
        let mut input_tensors = HashMap::new();
        input_tensors.insert(self.input_name.as_str(), value);

        let outputs = self.session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        // Batch of one: [1, num_classes] flattens to the class scores
        Ok(output_tensor.iter().copied().collect())
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }
}

use std::sync::Arc;

use log::debug;

use super::error::ClassifierError;
use super::labels::{argmax, LabelMap};
use super::model::ScoreModel;
use super::sequence::pad_sequence;
use super::tokenizer::TextEncoder;

/// Result of classifying one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Index of the winning class
    pub index: usize,
    /// Display label of the winning class
    pub label: String,
    /// Raw scores, one per class
    pub scores: Vec<f32>,
}

/// A thread-safe emotion classifier: tokenizer, fixed-length padding, ONNX model and label map.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync` because all of its fields are thread-safe:
/// - `LabelMap` and `usize` are `Send + Sync`
/// - the encoder and the model are `Send + Sync` trait objects behind `Arc`
///
/// Multi-thread usage:
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use emotion_predictor::{ArtifactStore, EmotionClassifier};
/// use std::sync::Arc;
/// use std::thread;
///
/// let store = ArtifactStore::new_default();
/// let classifier = Arc::new(EmotionClassifier::builder()
///     .with_artifacts(&store)?
///     .build()?);
///
/// let classifier_clone = Arc::clone(&classifier);
/// thread::spawn(move || {
///     classifier_clone.predict("I am so happy today").unwrap();
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EmotionClassifier {
    pub(crate) encoder: Arc<dyn TextEncoder>,
    pub(crate) model: Arc<dyn ScoreModel>,
    pub(crate) labels: LabelMap,
    pub(crate) max_len: usize,
    pub(crate) model_path: Option<String>,
    pub(crate) tokenizer_path: Option<String>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<EmotionClassifier>();
    }
};

impl EmotionClassifier {
    /// Creates a new EmotionClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::EmotionClassifierBuilder {
        super::builder::EmotionClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            tokenizer_kind: self.encoder.kind(),
            vocab_size: self.encoder.vocab_size(),
            max_len: self.max_len,
            class_labels: self.labels.labels().to_vec(),
        }
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Tokenizes the text and brings it to the model's fixed length.
    pub fn encode(&self, text: &str) -> Result<Vec<i64>, ClassifierError> {
        let tokens = self.encoder.encode(text)?;
        debug!("Encoded {} token(s)", tokens.len());
        Ok(pad_sequence(&tokens, self.max_len))
    }

    /// Predicts the emotion of the input text.
    ///
    /// Empty text is valid input and still yields one of the configured labels.
    ///
    /// # Errors
    /// - `TokenizerError` if the text cannot be encoded
    /// - `ModelError` if the model cannot run on the sequence
    /// - `PredictionError` if the scores do not line up with the label map
    pub fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let padded = self.encode(text)?;
        let scores = self.model.infer(&padded)?;

        if scores.len() != self.labels.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model returned {} scores but {} labels are configured",
                scores.len(),
                self.labels.len()
            )));
        }

        let index = argmax(&scores).ok_or_else(|| {
            ClassifierError::PredictionError("Model returned no comparable scores".into())
        })?;
        let label = self
            .labels
            .get(index)
            .ok_or_else(|| ClassifierError::PredictionError(format!("No label for class {}", index)))?
            .to_string();

        debug!("Predicted class {} ({}) from scores {:?}", index, label, scores);
        Ok(Prediction { index, label, scores })
    }
}

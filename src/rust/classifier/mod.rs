mod error;
mod classifier;
pub mod builder;
pub mod labels;
pub mod model;
pub mod sequence;
pub mod tokenizer;

pub use error::ClassifierError;
pub use classifier::{EmotionClassifier, Prediction};
pub use builder::EmotionClassifierBuilder;
pub use labels::{argmax, LabelMap, EMOTION_LABELS};
pub use model::{OnnxModel, ScoreModel};
pub use sequence::{pad_sequence, MAX_LEN};
pub use tokenizer::{load_encoder, HfTokenizer, KerasTokenizer, TextEncoder};

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file, if loaded from disk
    pub model_path: Option<String>,
    /// Path to the tokenizer file, if loaded from disk
    pub tokenizer_path: Option<String>,
    /// Format of the tokenizer artifact
    pub tokenizer_kind: &'static str,
    /// Number of entries in the vocabulary
    pub vocab_size: usize,
    /// Length every sequence is padded or truncated to
    pub max_len: usize,
    /// Labels of the classes, in model output order
    pub class_labels: Vec<String>,
}

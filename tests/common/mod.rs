#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use emotion_predictor::classifier::KerasTokenizer;
use emotion_predictor::{ClassifierError, EmotionClassifier, ScoreModel};
use env_logger::{Builder, Env};

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// The Keras `Tokenizer.to_json()` layout, with `word_index` as an encoded string.
pub fn keras_tokenizer_json() -> String {
    let word_index = serde_json::json!({
        "<OOV>": 1, "i": 2, "feel": 3, "am": 4, "so": 5, "happy": 6, "today": 7,
        "sad": 8, "angry": 9, "scared": 10, "love": 11, "you": 12, "wow": 13
    });
    serde_json::json!({
        "class_name": "Tokenizer",
        "config": {
            "num_words": null,
            "filters": "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n",
            "lower": true,
            "split": " ",
            "char_level": false,
            "oov_token": "<OOV>",
            "document_count": 4,
            "word_counts": "{}",
            "word_docs": "{}",
            "index_docs": "{}",
            "index_word": "{}",
            "word_index": word_index.to_string()
        }
    })
    .to_string()
}

pub fn keras_tokenizer() -> KerasTokenizer {
    KerasTokenizer::from_json_str(&keras_tokenizer_json()).expect("valid tokenizer json")
}

/// Deterministic stand-in for the trained model: the class is picked from the
/// token ids, so different texts land on different labels.
#[derive(Debug, Default)]
pub struct HashingModel {
    pub calls: AtomicUsize,
}

impl ScoreModel for HashingModel {
    fn infer(&self, padded: &[i64]) -> Result<Vec<f32>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let sum: i64 = padded.iter().sum();
        let mut scores = vec![0.1f32; 6];
        scores[(sum % 6) as usize] = 0.9;
        Ok(scores)
    }
}

/// A model that always fails, as a broken artifact would.
#[derive(Debug)]
pub struct FailingModel;

impl ScoreModel for FailingModel {
    fn infer(&self, _padded: &[i64]) -> Result<Vec<f32>, ClassifierError> {
        Err(ClassifierError::ModelError("Failed to run model: shape mismatch".into()))
    }
}

/// A model that panics mid-inference.
#[derive(Debug)]
pub struct PanickingModel;

impl ScoreModel for PanickingModel {
    fn infer(&self, _padded: &[i64]) -> Result<Vec<f32>, ClassifierError> {
        panic!("numeric failure inside the runtime")
    }
}

pub fn classifier_with<M: ScoreModel + 'static>(model: M) -> EmotionClassifier {
    EmotionClassifier::builder()
        .with_encoder(keras_tokenizer())
        .with_model(model)
        .build()
        .expect("Failed to create classifier")
}

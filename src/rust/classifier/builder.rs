use std::sync::Arc;

use log::{error, info};

use super::classifier::EmotionClassifier;
use super::error::ClassifierError;
use super::labels::LabelMap;
use super::model::{OnnxModel, ScoreModel};
use super::sequence::MAX_LEN;
use super::tokenizer::{load_encoder, TextEncoder};
use crate::artifacts::ArtifactStore;
use crate::runtime::RuntimeConfig;

/// A builder for constructing an EmotionClassifier with a fluent interface.
///
/// Artifacts are read in [`build`](Self::build), after every setting is known,
/// so the model can be checked against the configured sequence length.
#[derive(Debug)]
pub struct EmotionClassifierBuilder {
    artifacts: Option<ArtifactStore>,
    encoder: Option<Arc<dyn TextEncoder>>,
    model: Option<Arc<dyn ScoreModel>>,
    labels: LabelMap,
    max_len: usize,
    runtime_config: RuntimeConfig,
}

impl Default for EmotionClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionClassifierBuilder {
    /// Creates a builder with the emotion labels and the trained sequence length
    pub fn new() -> Self {
        Self {
            artifacts: None,
            encoder: None,
            model: None,
            labels: LabelMap::emotions(),
            max_len: MAX_LEN,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution
    ///
    /// # Example
    /// ```
    /// use emotion_predictor::{EmotionClassifierBuilder, RuntimeConfig};
    ///
    /// let config = RuntimeConfig::default();
    /// let builder = EmotionClassifierBuilder::new()
    ///     .with_runtime_config(config);
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Overrides the padded sequence length. Must match what the model was trained with.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_labels(mut self, labels: LabelMap) -> Self {
        self.labels = labels;
        self
    }

    /// Loads the tokenizer and the ONNX model from the store when the classifier is built.
    ///
    /// An encoder or model set with [`with_encoder`](Self::with_encoder) or
    /// [`with_model`](Self::with_model) takes the place of the matching artifact,
    /// whichever order the calls come in.
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - An artifact store is already set
    ///
    /// # Example
    /// ```
    /// use emotion_predictor::{ArtifactStore, EmotionClassifierBuilder};
    ///
    /// let builder = EmotionClassifierBuilder::new()
    ///     .with_artifacts(&ArtifactStore::new("/srv/emotion"));
    /// assert!(builder.is_ok());
    /// ```
    pub fn with_artifacts(mut self, store: &ArtifactStore) -> Result<Self, ClassifierError> {
        if self.artifacts.is_some() {
            return Err(ClassifierError::BuildError("Artifact store already set".to_string()));
        }
        self.artifacts = Some(store.clone());
        Ok(self)
    }

    /// Uses an already constructed encoder instead of the tokenizer artifact
    pub fn with_encoder<E: TextEncoder + 'static>(self, encoder: E) -> Self {
        self.with_encoder_arc(Arc::new(encoder))
    }

    pub fn with_encoder_arc(mut self, encoder: Arc<dyn TextEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Uses an already constructed model instead of the ONNX artifact
    pub fn with_model<M: ScoreModel + 'static>(self, model: M) -> Self {
        self.with_model_arc(Arc::new(model))
    }

    pub fn with_model_arc(mut self, model: Arc<dyn ScoreModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Builds and returns the final EmotionClassifier instance
    ///
    /// # Returns
    /// * `Result<EmotionClassifier, ClassifierError>` - The constructed classifier if successful, or an error if:
    ///   - Neither artifacts nor an encoder and model were provided
    ///   - The maximum sequence length is zero
    ///   - An artifact is missing or cannot be deserialized
    ///   - The model's declared sequence length disagrees with the configured one
    ///   - The model declares a number of classes other than the number of labels
    pub fn build(self) -> Result<EmotionClassifier, ClassifierError> {
        if self.max_len == 0 {
            return Err(ClassifierError::ValidationError("Maximum sequence length must be positive".into()));
        }
        let labels = self.labels;

        let mut model_path = None;
        let mut tokenizer_path = None;

        let (encoder, model) = match (self.encoder, self.model, self.artifacts) {
            (Some(encoder), Some(model), _) => (encoder, model),
            (encoder, model, Some(store)) => {
                store.ensure_present()?;

                let encoder = match encoder {
                    Some(encoder) => encoder,
                    None => {
                        let loaded = load_encoder(store.tokenizer_path()).map_err(|e| {
                            error!("Failed to load tokenizer: {}", e);
                            ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
                        })?;
                        tokenizer_path = Some(store.tokenizer_path().to_string_lossy().to_string());
                        Arc::from(loaded)
                    }
                };
                info!("Tokenizer ready ({})", encoder.kind());

                let model = match model {
                    Some(model) => model,
                    None => {
                        let loaded = OnnxModel::from_file(store.model_path(), self.max_len, &self.runtime_config)
                            .map_err(|e| {
                                error!("Failed to load model: {}", e);
                                ClassifierError::BuildError(format!("Failed to load model: {}", e))
                            })?;
                        model_path = Some(store.model_path().to_string_lossy().to_string());
                        Arc::new(loaded) as Arc<dyn ScoreModel>
                    }
                };
                info!("Model structure validated successfully");

                (encoder, model)
            }
            _ => {
                return Err(ClassifierError::BuildError(
                    "Model and tokenizer must be set, either from artifacts or directly".to_string(),
                ))
            }
        };

        if let Some(classes) = model.num_classes() {
            if classes != labels.len() {
                error!("Model scores {} classes but {} labels are configured", classes, labels.len());
                return Err(ClassifierError::ValidationError(format!(
                    "Model scores {} classes but {} labels are configured",
                    classes,
                    labels.len()
                )));
            }
        }

        Ok(EmotionClassifier {
            encoder,
            model,
            labels,
            max_len: self.max_len,
            model_path,
            tokenizer_path,
        })
    }
}

//! Emotion prediction service: a pre-trained text classifier behind a single HTTP route.
//!
//! Text is tokenized with the vocabulary exported alongside the model, padded
//! to the trained sequence length, scored by an ONNX model and mapped to an
//! emoji.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emotion_predictor::{ArtifactStore, EmotionClassifier};
//!
//! let store = ArtifactStore::new("./artifacts");
//! let classifier = EmotionClassifier::builder()
//!     .with_artifacts(&store)?
//!     .build()?;
//!
//! let prediction = classifier.predict("I am so happy today")?;
//! println!("Predicted emotion: {}", prediction.label);
//! # Ok(())
//! # }
//! ```
//!
//! # Serving
//!
//! ```rust,no_run
//! # async fn run() -> anyhow::Result<()> {
//! use emotion_predictor::{server, ArtifactStore, EmotionClassifier};
//!
//! let classifier = EmotionClassifier::builder()
//!     .with_artifacts(&ArtifactStore::new_default())?
//!     .build()?;
//!
//! let config = server::ServerConfig::default();
//! server::serve(server::AppState::new(classifier), &config).await?;
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod classifier;
mod runtime;
pub mod server;

pub use artifacts::{ArtifactChecksums, ArtifactError, ArtifactStore};
pub use classifier::{
    ClassifierError, ClassifierInfo, EmotionClassifier, EmotionClassifierBuilder, LabelMap, Prediction,
    ScoreModel, TextEncoder, MAX_LEN,
};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

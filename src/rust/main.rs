use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use emotion_predictor::server::{self, AppState, ServerConfig, DEFAULT_ALLOWED_ORIGINS};
use emotion_predictor::{
    init_logger, ArtifactChecksums, ArtifactStore, EmotionClassifier, OptimizationLevel, RuntimeConfig, MAX_LEN,
};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Directory holding the model and tokenizer artifacts
    /// [default: $EMOTION_PREDICTOR_ARTIFACTS, the working directory, or the user data directory]
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Path to the ONNX model, overriding the artifact directory
    #[arg(long)]
    model: Option<PathBuf>,

    /// Path to the tokenizer JSON, overriding the artifact directory
    #[arg(long)]
    tokenizer: Option<PathBuf>,

    /// Allowed CORS origin; repeat for several
    #[arg(long = "allow-origin", default_values_t = DEFAULT_ALLOWED_ORIGINS.map(String::from))]
    allowed_origins: Vec<String>,

    /// Sequence length the model was trained with
    #[arg(long, default_value_t = MAX_LEN)]
    max_len: usize,

    /// Expected SHA-256 of the model file
    #[arg(long)]
    model_sha256: Option<String>,

    /// Expected SHA-256 of the tokenizer file
    #[arg(long)]
    tokenizer_sha256: Option<String>,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    intra_threads: usize,

    /// ONNX Runtime inter-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    inter_threads: usize,

    /// ONNX graph optimization level
    #[arg(long, value_enum, default_value_t = OptimizationLevel::All)]
    optimization: OptimizationLevel,
}

impl Args {
    fn artifact_store(&self) -> ArtifactStore {
        let mut store = match &self.artifacts_dir {
            Some(dir) => ArtifactStore::new(dir),
            None => ArtifactStore::new_default(),
        };
        if let Some(model) = &self.model {
            store = store.with_model_path(model);
        }
        if let Some(tokenizer) = &self.tokenizer {
            store = store.with_tokenizer_path(tokenizer);
        }
        store
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            allowed_origins: self.allowed_origins.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();
    let args = Args::parse();

    info!("=== Starting Emotion Predictor ===");
    let start_time = Instant::now();

    let store = args.artifact_store();
    info!("Artifact directory: {:?}", store.artifacts_dir());
    store
        .verify(&ArtifactChecksums {
            model_sha256: args.model_sha256.clone(),
            tokenizer_sha256: args.tokenizer_sha256.clone(),
        })
        .context("Artifact check failed")?;

    let runtime_config = RuntimeConfig {
        inter_threads: args.inter_threads,
        intra_threads: args.intra_threads,
        optimization_level: args.optimization,
    };

    let classifier = EmotionClassifier::builder()
        .with_runtime_config(runtime_config)
        .with_max_len(args.max_len)
        .with_artifacts(&store)?
        .build()
        .context("Failed to load classifier")?;

    let info = classifier.info();
    info!(
        "=== Classifier Ready (took {:.2?}): {} tokenizer, {} words, max_len {}, labels {:?} ===",
        start_time.elapsed(),
        info.tokenizer_kind,
        info.vocab_size,
        info.max_len,
        info.class_labels
    );

    server::serve(AppState::new(classifier), &args.server_config()).await
}

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::classifier::EmotionClassifier;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictRequest {
    pub text: String,
}

/// Shared application state, loaded once at startup
#[derive(Debug, Clone)]
pub struct AppState {
    pub classifier: Arc<EmotionClassifier>,
}

impl AppState {
    pub fn new(classifier: EmotionClassifier) -> Self {
        Self {
            classifier: Arc::new(classifier),
        }
    }
}

/// `POST /predict`: answers with the emoji label as a bare JSON string.
///
/// Inference is CPU-bound, so the whole pipeline runs on the blocking pool.
pub async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<String>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        debug!("Rejected predict request: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;
    debug!("Received predict request ({} chars)", req.text.chars().count());

    let classifier = Arc::clone(&state.classifier);
    let prediction = tokio::task::spawn_blocking(move || classifier.predict(&req.text))
        .await
        .map_err(|e| {
            error!("Prediction task failed: {}", e);
            ApiError::Prediction(e.to_string())
        })?
        .map_err(|e| {
            error!("Prediction error: {}", e);
            ApiError::Prediction(e.to_string())
        })?;

    Ok(Json(prediction.label))
}

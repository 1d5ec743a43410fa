use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Body of every non-200 response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Errors surfaced by the HTTP layer.
///
/// Everything that goes wrong after the request was accepted collapses into
/// `Prediction`; the client never sees which stage failed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{}", .0.body_text())]
    InvalidRequest(#[from] JsonRejection),
    #[error("Error in prediction: {0}")]
    Prediction(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(rejection) => rejection.status(),
            Self::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

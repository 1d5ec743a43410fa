mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use emotion_predictor::classifier::EMOTION_LABELS;
use emotion_predictor::server::{create_router, AppState, ServerConfig};
use emotion_predictor::EmotionClassifier;
use serde_json::Value;
use tower::ServiceExt;

use common::{FailingModel, HashingModel, PanickingModel};

fn router_with(classifier: EmotionClassifier) -> Router {
    create_router(AppState::new(classifier), &ServerConfig::default())
}

fn predict_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_predict_returns_bare_emoji_string() {
    common::init();
    let router = router_with(common::classifier_with(HashingModel::default()));

    let response = router
        .oneshot(predict_request(r#"{"text": "I am so happy today"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let label = body.as_str().expect("response must be a bare JSON string");
    assert!(EMOTION_LABELS.contains(&label));
}

#[tokio::test]
async fn test_empty_text_still_predicts() {
    let router = router_with(common::classifier_with(HashingModel::default()));

    let response = router.oneshot(predict_request(r#"{"text": ""}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(EMOTION_LABELS.contains(&body.as_str().unwrap()));
}

#[tokio::test]
async fn test_large_body_is_accepted() {
    let model = Arc::new(HashingModel::default());
    let classifier = EmotionClassifier::builder()
        .with_encoder(common::keras_tokenizer())
        .with_model_arc(model.clone())
        .build()
        .unwrap();
    let router = router_with(classifier);

    // About 2.4 MB, above axum's default 2 MB body limit
    let body = serde_json::json!({ "text": "happy ".repeat(400_000) }).to_string();
    assert!(body.len() > 2 * 1024 * 1024);

    let response = router.oneshot(predict_request(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(EMOTION_LABELS.contains(&body.as_str().unwrap()));
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_text_is_rejected_before_inference() {
    let model = Arc::new(HashingModel::default());
    let classifier = EmotionClassifier::builder()
        .with_encoder(common::keras_tokenizer())
        .with_model_arc(model.clone())
        .build()
        .unwrap();
    let router = router_with(classifier);

    for body in [r#"{"message": "hi"}"#, r#"{"text": 5}"#, "not json"] {
        let response = router.clone().oneshot(predict_request(body)).await.unwrap();
        assert!(response.status().is_client_error(), "{} -> {}", body, response.status());
        let body = json_body(response).await;
        assert!(body["detail"].is_string());
    }
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_model_failure_maps_to_500() {
    let router = router_with(common::classifier_with(FailingModel));

    let response = router
        .oneshot(predict_request(r#"{"text": "I am so happy today"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(
        body["detail"],
        "Error in prediction: Model error: Failed to run model: shape mismatch"
    );
}

#[tokio::test]
async fn test_model_panic_maps_to_500() {
    let router = router_with(common::classifier_with(PanickingModel));

    let response = router
        .clone()
        .oneshot(predict_request(r#"{"text": "wow"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().starts_with("Error in prediction: "));

    // The server keeps answering after a failed request
    let response = router.oneshot(predict_request(r#"{"text": "wow"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_cors_allowed_origin() {
    let router = router_with(common::classifier_with(HashingModel::default()));

    let mut request = predict_request(r#"{"text": "wow"}"#);
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://localhost:8081".parse().unwrap());
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:8081");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_cors_disallowed_origin() {
    let router = router_with(common::classifier_with(HashingModel::default()));

    let mut request = predict_request(r#"{"text": "wow"}"#);
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://evil.example.com".parse().unwrap());
    let response = router.oneshot(request).await.unwrap();

    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_cors_preflight_mirrors_request() {
    let router = router_with(common::classifier_with(HashingModel::default()));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/predict")
        .header(header::ORIGIN, "http://localhost:8081")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,x-client-id")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:8081");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type,x-client-id");
}

#[tokio::test]
async fn test_custom_origin_list() {
    let config = ServerConfig {
        allowed_origins: vec!["https://app.example.com".to_string()],
        ..ServerConfig::default()
    };
    let router = create_router(
        AppState::new(common::classifier_with(HashingModel::default())),
        &config,
    );

    let mut request = predict_request(r#"{"text": "wow"}"#);
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://localhost:8081".parse().unwrap());
    let response = router.oneshot(request).await.unwrap();

    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

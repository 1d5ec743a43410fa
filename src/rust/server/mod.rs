//! HTTP surface: a single `POST /predict` route behind an origin allow-list.

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::post,
    Router,
};
use log::{error, info, warn};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

mod error;
mod handlers;

pub use error::{ApiError, ErrorBody};
pub use handlers::{predict_handler, AppState, PredictRequest};

/// Origins allowed by default: the React Native dev server and the tunnel used to reach it.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = [
    "http://localhost:8081",
    "https://2023-2402-4000-13cd-2f7e-876-a9c1-210b-63e5.ngrok-free.app",
];

/// Listener and cross-origin settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// CORS policy: listed origins only; methods and headers are mirrored for
/// them and credentials are allowed.
///
/// Origins that are not valid header values are skipped with a warning.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Create the router with the predict route and the CORS layer.
///
/// Request bodies are not size-limited; the model only ever sees the first
/// `max_len` tokens.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/predict", post(predict_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(cors_layer(&config.allowed_origins))
        .with_state(state)
}

/// Binds the listener and serves until the process is stopped.
pub async fn serve(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let router = create_router(state, config);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|e| {
            error!("FATAL: Failed to bind listener to {}:{}: {}", config.host, config.port, e);
            anyhow::anyhow!(
                "Failed to bind listener to {}:{}: {}. Address may be in use or require elevated permissions.",
                config.host,
                config.port,
                e
            )
        })?;

    let local_addr: SocketAddr = listener.local_addr()?;
    info!("Listening on http://{}/predict", local_addr);
    info!("Allowed origins: {:?}", config.allowed_origins);

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|e| {
            error!("Server error: {}", e);
            anyhow::anyhow!("Server error: {}", e)
        })?;

    Ok(())
}

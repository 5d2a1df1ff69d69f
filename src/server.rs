use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::api::{platform_catalog, ApiResponse, HealthResponse, PlatformInfo};
use crate::config::ServerConfig;
use crate::engine::RecommendationEngine;
use crate::error::EngineError;
use crate::Recommendation;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
}

impl AppState {
    pub fn new(engine: RecommendationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/platforms", get(platforms))
        .route("/api/campaign/recommendations", post(recommendations))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The engine is fully built (model loaded or failed) before the listener
/// binds, so no request can observe a half-initialized model.
pub async fn serve(engine: RecommendationEngine, config: &ServerConfig) -> Result<(), String> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;
    let app = router(AppState::new(engine), &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind server: {}", err))?;
    info!(addr = %addr, "Campaign advisor listening");

    axum::serve(listener, app)
        .await
        .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.engine.model_status()))
}

pub async fn platforms() -> Json<ApiResponse<Vec<PlatformInfo>>> {
    Json(ApiResponse::ok(platform_catalog()))
}

/// Body is taken raw so an empty or malformed payload reaches the validator
/// instead of being rejected by the extractor.
pub async fn recommendations(
    State(state): State<AppState>,
    body: String,
) -> (StatusCode, Json<ApiResponse<Recommendation>>) {
    let payload = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or_else(|err| {
            warn!(error = %err, "Campaign payload is not valid JSON");
            Value::Null
        })
    };

    match state.engine.recommend(&payload) {
        Ok(recommendation) => (StatusCode::OK, Json(ApiResponse::ok(recommendation))),
        Err(EngineError::Validation(err)) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::failure(err.to_string())),
        ),
        Err(err) => {
            error!(error = %err, "Recommendation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure(err.to_string())),
            )
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

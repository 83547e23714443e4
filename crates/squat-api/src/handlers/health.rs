//! Health check handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub frame_rate: f64,
    pub max_frames: usize,
    pub live_window_frames: usize,
}

/// Readiness check endpoint (readiness probe).
///
/// The analyzer is validated when the state is built, so a running server is
/// always ready; the body reports the active limits.
pub async fn ready(State(state): State<AppState>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready".to_string(),
        frame_rate: state.analyzer.extractor().config().frame_rate,
        max_frames: state.config.max_frames,
        live_window_frames: state.config.live_window_frames,
    })
}

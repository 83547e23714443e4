//! Sequence analysis handler.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use squat_models::{AnalysisResponse, RawFrame};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Request body for `POST /api/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Landmarks for every frame, in capture order.
    pub frames: Vec<RawFrame>,
}

impl AnalyzeRequest {
    pub fn validate(&self, max_frames: usize) -> ApiResult<()> {
        if self.frames.len() > max_frames {
            return Err(ApiError::PayloadTooLarge(format!(
                "{} frames submitted, at most {} are accepted",
                self.frames.len(),
                max_frames
            )));
        }
        Ok(())
    }
}

/// Analyse a complete landmark sequence.
///
/// POST /api/analyze
pub async fn analyze_sequence(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Json<AnalysisResponse>> {
    let Json(request) = payload.map_err(rejection_to_error)?;
    request.validate(state.config.max_frames)?;

    let response = run_analysis(&state, request.frames, "upload").await?;
    Ok(Json(response))
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(rejection.body_text()),
        // Well-formed JSON that doesn't fit the landmark shape
        StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(rejection.body_text()),
        _ => ApiError::bad_request(rejection.body_text()),
    }
}

/// Run the analyzer off the async runtime, bounded by the request timeout.
///
/// Shared by the HTTP and live WebSocket paths; `source` labels metrics.
pub(crate) async fn run_analysis(
    state: &AppState,
    frames: Vec<RawFrame>,
    source: &'static str,
) -> ApiResult<AnalysisResponse> {
    let analyzer = Arc::clone(&state.analyzer);
    let frame_count = frames.len();
    let start = Instant::now();

    let task = tokio::task::spawn_blocking(move || analyzer.analyze(&frames));
    let outcome = tokio::time::timeout(state.config.request_timeout, task)
        .await
        .map_err(|_| {
            metrics::record_analysis_failure(source, "timeout");
            warn!(source, frames = frame_count, "Analysis timed out");
            ApiError::Timeout
        })?
        .map_err(|e| ApiError::internal(format!("Analysis task failed: {}", e)))?;

    let elapsed = start.elapsed();
    match outcome {
        Ok(response) => {
            metrics::record_analysis(
                source,
                frame_count,
                response.classification.is_good,
                elapsed.as_secs_f64(),
            );
            info!(
                source,
                frames = frame_count,
                is_good = response.classification.is_good,
                confidence = response.classification.confidence,
                duration_ms = elapsed.as_millis() as u64,
                "Analysis completed"
            );
            Ok(response)
        }
        Err(e) => {
            metrics::record_analysis_failure(source, e.kind().as_str());
            warn!(source, frames = frame_count, error = %e, "Analysis failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_frame_cap() {
        let request = AnalyzeRequest {
            frames: vec![Vec::new(); 3],
        };
        assert!(request.validate(3).is_ok());
        assert!(matches!(
            request.validate(2),
            Err(ApiError::PayloadTooLarge(_))
        ));
    }
}

//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "squat_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "squat_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "squat_http_requests_in_flight";

    // WebSocket metrics
    pub const WS_CONNECTIONS_TOTAL: &str = "squat_ws_connections_total";
    pub const WS_CONNECTIONS_ACTIVE: &str = "squat_ws_connections_active";
    pub const WS_MESSAGES_SENT: &str = "squat_ws_messages_sent_total";
    pub const WS_MESSAGES_RECEIVED: &str = "squat_ws_messages_received_total";

    // Analysis metrics
    pub const ANALYSES_TOTAL: &str = "squat_analyses_total";
    pub const ANALYSIS_FAILURES_TOTAL: &str = "squat_analysis_failures_total";
    pub const ANALYSIS_DURATION_SECONDS: &str = "squat_analysis_duration_seconds";
    pub const ANALYSIS_FRAMES: &str = "squat_analysis_frames";
    pub const GOOD_FORM_TOTAL: &str = "squat_good_form_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "squat_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record WebSocket connection.
pub fn record_ws_connection(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::WS_CONNECTIONS_TOTAL, &labels).increment(1);
}

/// Update active WebSocket connections gauge.
pub fn set_ws_active_connections(count: i64) {
    gauge!(names::WS_CONNECTIONS_ACTIVE).set(count as f64);
}

/// Record WebSocket message sent.
pub fn record_ws_message_sent(endpoint: &str, message_type: &str) {
    let labels = [
        ("endpoint", endpoint.to_string()),
        ("type", message_type.to_string()),
    ];
    counter!(names::WS_MESSAGES_SENT, &labels).increment(1);
}

/// Record WebSocket message received.
pub fn record_ws_message_received(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::WS_MESSAGES_RECEIVED, &labels).increment(1);
}

/// Record a completed analysis run.
pub fn record_analysis(source: &str, frames: usize, is_good: bool, duration_secs: f64) {
    let labels = [("source", source.to_string())];
    counter!(names::ANALYSES_TOTAL, &labels).increment(1);
    histogram!(names::ANALYSIS_DURATION_SECONDS, &labels).record(duration_secs);
    histogram!(names::ANALYSIS_FRAMES, &labels).record(frames as f64);
    if is_good {
        counter!(names::GOOD_FORM_TOTAL, &labels).increment(1);
    }
}

/// Record an analysis run that ended in an error.
pub fn record_analysis_failure(source: &str, kind: &str) {
    let labels = [
        ("source", source.to_string()),
        ("kind", kind.to_string()),
    ];
    counter!(names::ANALYSIS_FAILURES_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(path: &str) {
    let labels = [("endpoint", sanitize_path(path).to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Label for a request path.
///
/// Only routed paths keep their own label; everything else collapses to
/// `/other` so label cardinality stays bounded.
fn sanitize_path(path: &str) -> &'static str {
    match path {
        "/api/analyze" => "/api/analyze",
        "/ws/live" => "/ws/live",
        "/health" => "/health",
        "/healthz" => "/healthz",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        _ => "/other",
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

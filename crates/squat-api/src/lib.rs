//! Axum HTTP/WebSocket server for squat form analysis.
//!
//! This crate provides:
//! - `POST /api/analyze` for complete landmark sequences
//! - `/ws/live` for frame-by-frame live analysis
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

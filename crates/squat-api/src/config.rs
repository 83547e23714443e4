//! API configuration.

use std::time::Duration;

use squat_analysis::AnalysisConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Upper bound on a single analysis run
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Max frames accepted in one sequence
    pub max_frames: usize,
    /// Frames kept per live connection; 1 analyses each frame on its own
    pub live_window_frames: usize,
    /// Close live connections idle for this long
    pub ws_idle_timeout: Duration,
    /// Environment (development/production)
    pub environment: String,
    /// Extraction constants and classification thresholds
    pub analysis: AnalysisConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            request_timeout: Duration::from_secs(30),
            max_body_size: 64 * 1024 * 1024, // 64MB
            max_frames: 18_000,              // 10 minutes at 30fps
            live_window_frames: 1,
            ws_idle_timeout: Duration::from_secs(60),
            environment: "development".to_string(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let max_frames = std::env::var("MAX_FRAMES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(18_000);
        let requested_window = std::env::var("LIVE_WINDOW_FRAMES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .or_else(|_| std::env::var("API_PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024 * 1024),
            max_frames,
            live_window_frames: live_window_frames(requested_window, max_frames),
            ws_idle_timeout: Duration::from_secs(
                std::env::var("WS_IDLE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            analysis: AnalysisConfig::from_env(),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

/// Live window size bounded to `1..=max_frames`.
fn live_window_frames(requested: usize, max_frames: usize) -> usize {
    requested.clamp(1, max_frames.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_window_bounded_by_frame_cap() {
        assert_eq!(live_window_frames(0, 18_000), 1);
        assert_eq!(live_window_frames(30, 18_000), 30);
        assert_eq!(live_window_frames(usize::MAX, 18_000), 18_000);
        assert_eq!(live_window_frames(5, 0), 1);
    }
}

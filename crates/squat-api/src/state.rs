//! Application state.

use std::sync::Arc;

use squat_analysis::{AnalysisResult, SquatAnalyzer};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub analyzer: Arc<SquatAnalyzer>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> AnalysisResult<Self> {
        let analyzer = SquatAnalyzer::new(config.analysis)?;
        Ok(Self {
            config,
            analyzer: Arc::new(analyzer),
        })
    }
}

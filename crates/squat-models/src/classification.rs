//! Form classification output types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::{Metrics, PoseAnalysis};

/// Pass/fail judgment for a squat sequence with ordered coaching feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormClassification {
    pub is_good: bool,
    /// Mean of depth, knee symmetry, hip symmetry and stability.
    pub confidence: f64,
    /// Never empty; order follows the checks that produced each entry.
    pub feedback: Vec<String>,
    pub detailed_metrics: Metrics,
}

/// Success body returned by both the upload endpoint and live mode.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResponse {
    pub success: bool,
    pub analysis: PoseAnalysis,
    pub classification: FormClassification,
}

impl AnalysisResponse {
    pub fn new(analysis: PoseAnalysis, classification: FormClassification) -> Self {
        Self {
            success: true,
            analysis,
            classification,
        }
    }
}

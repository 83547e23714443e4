//! Configuration for pose metrics extraction and form classification.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// Constants used while turning landmarks into angle/velocity series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Assumed capture rate used to scale per-frame displacement into a
    /// velocity. Not derived from real capture timestamps.
    pub frame_rate: f64,

    /// Vertical offset (normalized units) of the synthetic point placed above
    /// each ankle. The ankle angle is measured between the shin and this point,
    /// approximating the shin's angle from vertical.
    pub ankle_reference_offset: f64,

    /// Knee angle treated as full depth (thighs parallel), in degrees.
    pub depth_reference_angle: f64,

    /// Back-angle standard deviation that drives stability to zero, in degrees.
    pub stability_reference_angle: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            ankle_reference_offset: 0.1,
            depth_reference_angle: 90.0,
            stability_reference_angle: 45.0,
        }
    }
}

/// Thresholds for the form checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    // ============================================
    // Depth
    // ============================================
    /// Depth score below this produces a mild depth note.
    pub depth: f64,
    /// Depth score below this produces the stronger depth message instead.
    pub severe_depth: f64,

    // ============================================
    // Symmetry
    // ============================================
    pub knee_symmetry: f64,
    pub hip_symmetry: f64,
    pub ankle_symmetry: f64,

    // ============================================
    // Stability and torso lean
    // ============================================
    pub stability: f64,
    /// Maximum back angle (degrees) tolerated before a lean warning.
    pub back_angle: f64,
    /// Back angle (degrees) above which the lean warning is the strong variant.
    pub severe_back_angle: f64,

    // ============================================
    // Pace
    // ============================================
    /// Knee-velocity coefficient of variation above which pace is inconsistent.
    pub velocity_variation: f64,

    // ============================================
    // Overall verdict
    // ============================================
    /// Minimum form score for a passing verdict.
    pub good_form_score: f64,
    /// Most feedback entries a passing verdict may carry.
    pub max_feedback_for_good: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            depth: 0.8,
            severe_depth: 0.6,
            knee_symmetry: 0.85,
            hip_symmetry: 0.85,
            ankle_symmetry: 0.85,
            stability: 0.7,
            back_angle: 30.0,
            severe_back_angle: 45.0,
            velocity_variation: 0.5,
            good_form_score: 0.8,
            max_feedback_for_good: 1,
        }
    }
}

/// Combined analysis configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub extractor: ExtractorConfig,
    pub classifier: ClassifierConfig,
}

impl AnalysisConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = ExtractorConfig::default();
        Self {
            extractor: ExtractorConfig {
                frame_rate: std::env::var("SQUAT_FRAME_RATE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.frame_rate),
                ankle_reference_offset: std::env::var("SQUAT_ANKLE_REFERENCE_OFFSET")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.ankle_reference_offset),
                ..defaults
            },
            classifier: ClassifierConfig::default(),
        }
    }

    /// Reject values that would make the extractor divide by zero or
    /// produce meaningless scores.
    pub fn validate(&self) -> AnalysisResult<()> {
        let e = &self.extractor;
        let positive = [
            ("frame_rate", e.frame_rate),
            ("depth_reference_angle", e.depth_reference_angle),
            ("stability_reference_angle", e.stability_reference_angle),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if !e.ankle_reference_offset.is_finite() || e.ankle_reference_offset == 0.0 {
            return Err(AnalysisError::InvalidConfig(
                "ankle_reference_offset must be a non-zero number".to_string(),
            ));
        }

        let c = &self.classifier;
        if c.severe_depth > c.depth {
            return Err(AnalysisError::InvalidConfig(
                "severe_depth must not exceed depth".to_string(),
            ));
        }
        if c.severe_back_angle < c.back_angle {
            return Err(AnalysisError::InvalidConfig(
                "severe_back_angle must not be below back_angle".to_string(),
            ));
        }
        Ok(())
    }
}

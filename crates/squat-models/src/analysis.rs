//! Pose analysis output types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A left/right pair of per-frame angle series, in degrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SidedSeries {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

impl SidedSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            left: Vec::with_capacity(capacity),
            right: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, left: f64, right: f64) {
        self.left.push(left);
        self.right.push(right);
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Summary scores derived from a full frame sequence.
///
/// Each score is normalized to roughly 0..1 but is not clamped: a standing
/// pose yields a depth score near 2.0, and a very unstable torso can push
/// stability below zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Metrics {
    /// Smallest knee angle in the sequence relative to 90 degrees.
    pub depth_score: f64,
    pub knee_symmetry: f64,
    pub hip_symmetry: f64,
    pub ankle_symmetry: f64,
    /// 1 - stddev(back angle) / 45.
    pub stability_score: f64,
}

impl Metrics {
    /// Named values, in reporting order.
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("depth_score", self.depth_score),
            ("knee_symmetry", self.knee_symmetry),
            ("hip_symmetry", self.hip_symmetry),
            ("ankle_symmetry", self.ankle_symmetry),
            ("stability_score", self.stability_score),
        ]
    }
}

/// Angle and velocity series for a frame sequence plus its summary metrics.
///
/// Angle series are aligned 1:1 with the input frames. Velocity series have
/// one fewer entry: the first frame has nothing to diff against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PoseAnalysis {
    pub frame_count: usize,
    pub knee_angles: SidedSeries,
    pub hip_angles: SidedSeries,
    pub ankle_angles: SidedSeries,
    /// `|90 - a|` per frame, where `a` is the angle at the shoulder midpoint
    /// between the image top and the hip midpoint. An upright torso reads 90.
    pub back_angles: Vec<f64>,
    pub knee_velocities: Vec<f64>,
    pub hip_velocities: Vec<f64>,
    pub metrics: Metrics,
}

impl PoseAnalysis {
    /// Largest torso lean observed, or `None` for an empty series.
    pub fn max_back_angle(&self) -> Option<f64> {
        self.back_angles.iter().copied().reduce(f64::max)
    }
}

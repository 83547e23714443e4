//! Pose metrics extraction.
//!
//! Turns an ordered sequence of pose frames into per-frame joint angles,
//! frame-to-frame joint velocities and the summary [`Metrics`] used by the
//! form classifier. Aggregates need the whole sequence, so extraction is a
//! single pass over a complete slice rather than a streaming update.

use squat_models::{Landmark, Metrics, PoseAnalysis, PoseFrame, RawFrame, SidedSeries};
use tracing::debug;

use crate::config::ExtractorConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::geometry::{distance, joint_angle, midpoint};
use crate::stats;

/// Joint angles for a single frame, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAngles {
    pub knee_left: f64,
    pub knee_right: f64,
    pub hip_left: f64,
    pub hip_right: f64,
    pub ankle_left: f64,
    pub ankle_right: f64,
    /// Torso lean: `|90 - angle(vertical reference, shoulder mid, hip mid)|`.
    pub back: f64,
}

/// Left/right symmetry of two aligned angle series.
///
/// `1 - mean(|left - right|) / 180`: identical series score exactly 1.0 and
/// the score falls towards 0 as the sides diverge. Returns `None` for empty
/// or misaligned input.
pub fn symmetry(left: &[f64], right: &[f64]) -> Option<f64> {
    if left.len() != right.len() {
        return None;
    }
    let diffs: Vec<f64> = left.iter().zip(right).map(|(l, r)| (l - r).abs()).collect();
    stats::mean(&diffs).map(|mean_diff| 1.0 - mean_diff / 180.0)
}

/// Extracts angle/velocity series and summary metrics from pose frames.
#[derive(Debug, Clone, Default)]
pub struct PoseMetricsExtractor {
    config: ExtractorConfig,
}

impl PoseMetricsExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Lift raw landmark lists into named frames, then extract.
    ///
    /// Fails on the first frame lacking a required keypoint, reporting its
    /// position in the sequence.
    pub fn extract_raw(&self, frames: &[RawFrame]) -> AnalysisResult<PoseAnalysis> {
        if frames.is_empty() {
            return Err(AnalysisError::EmptySequence);
        }

        let frames = frames
            .iter()
            .enumerate()
            .map(|(i, raw)| PoseFrame::from_landmarks(raw).map_err(|e| AnalysisError::malformed(i, e)))
            .collect::<AnalysisResult<Vec<_>>>()?;

        self.extract(&frames)
    }

    /// Compute the full analysis bundle for a frame sequence.
    pub fn extract(&self, frames: &[PoseFrame]) -> AnalysisResult<PoseAnalysis> {
        if frames.is_empty() {
            return Err(AnalysisError::EmptySequence);
        }

        let n = frames.len();
        let mut knee_angles = SidedSeries::with_capacity(n);
        let mut hip_angles = SidedSeries::with_capacity(n);
        let mut ankle_angles = SidedSeries::with_capacity(n);
        let mut back_angles = Vec::with_capacity(n);

        for frame in frames {
            let angles = self.frame_angles(frame);
            knee_angles.push(angles.knee_left, angles.knee_right);
            hip_angles.push(angles.hip_left, angles.hip_right);
            ankle_angles.push(angles.ankle_left, angles.ankle_right);
            back_angles.push(angles.back);
        }

        let (knee_velocities, hip_velocities): (Vec<f64>, Vec<f64>) = frames
            .windows(2)
            .map(|pair| {
                let (prev, curr) = (&pair[0], &pair[1]);
                let knee = (self.joint_velocity(curr.left_knee, prev.left_knee)
                    + self.joint_velocity(curr.right_knee, prev.right_knee))
                    / 2.0;
                let hip = (self.joint_velocity(curr.left_hip, prev.left_hip)
                    + self.joint_velocity(curr.right_hip, prev.right_hip))
                    / 2.0;
                (knee, hip)
            })
            .unzip();

        // Huge but finite coordinates can still overflow in the geometry.
        let series: [(&'static str, &[f64]); 9] = [
            ("knee_angles", &knee_angles.left),
            ("knee_angles", &knee_angles.right),
            ("hip_angles", &hip_angles.left),
            ("hip_angles", &hip_angles.right),
            ("ankle_angles", &ankle_angles.left),
            ("ankle_angles", &ankle_angles.right),
            ("back_angles", &back_angles),
            ("knee_velocities", &knee_velocities),
            ("hip_velocities", &hip_velocities),
        ];
        for (metric, values) in series {
            if values.iter().any(|v| !v.is_finite()) {
                return Err(AnalysisError::NonFinite { metric });
            }
        }

        let metrics = self.metrics(&knee_angles, &hip_angles, &ankle_angles, &back_angles)?;

        debug!(
            frames = n,
            depth_score = metrics.depth_score,
            stability_score = metrics.stability_score,
            knee_symmetry = metrics.knee_symmetry,
            "Extracted pose metrics"
        );

        Ok(PoseAnalysis {
            frame_count: n,
            knee_angles,
            hip_angles,
            ankle_angles,
            back_angles,
            knee_velocities,
            hip_velocities,
            metrics,
        })
    }

    /// The six joint angles and the back angle for one frame.
    pub fn frame_angles(&self, frame: &PoseFrame) -> FrameAngles {
        let ankle_reference = |ankle: Landmark| {
            Landmark::new(ankle.x, ankle.y - self.config.ankle_reference_offset, ankle.z)
        };

        let shoulder_mid = midpoint(frame.left_shoulder, frame.right_shoulder);
        let hip_mid = midpoint(frame.left_hip, frame.right_hip);
        // Straight up from the shoulders, at the top edge of the image.
        let vertical_reference = Landmark::new(shoulder_mid.x, 0.0, 0.0);

        FrameAngles {
            knee_left: joint_angle(frame.left_hip, frame.left_knee, frame.left_ankle),
            knee_right: joint_angle(frame.right_hip, frame.right_knee, frame.right_ankle),
            hip_left: joint_angle(frame.left_shoulder, frame.left_hip, frame.left_knee),
            hip_right: joint_angle(frame.right_shoulder, frame.right_hip, frame.right_knee),
            ankle_left: joint_angle(
                frame.left_knee,
                frame.left_ankle,
                ankle_reference(frame.left_ankle),
            ),
            ankle_right: joint_angle(
                frame.right_knee,
                frame.right_ankle,
                ankle_reference(frame.right_ankle),
            ),
            back: (90.0 - joint_angle(vertical_reference, shoulder_mid, hip_mid)).abs(),
        }
    }

    /// Displacement between consecutive frames scaled by the assumed frame rate.
    pub fn joint_velocity(&self, current: Landmark, previous: Landmark) -> f64 {
        distance(current, previous) * self.config.frame_rate
    }

    /// `min(min knee angle) / depth_reference_angle`.
    pub fn depth_score(&self, knee_angles: &SidedSeries) -> Option<f64> {
        let deepest = stats::min(&knee_angles.left)?.min(stats::min(&knee_angles.right)?);
        Some(deepest / self.config.depth_reference_angle)
    }

    /// `1 - stddev(back angles) / stability_reference_angle`.
    pub fn stability_score(&self, back_angles: &[f64]) -> Option<f64> {
        stats::std_dev(back_angles).map(|sd| 1.0 - sd / self.config.stability_reference_angle)
    }

    fn metrics(
        &self,
        knee_angles: &SidedSeries,
        hip_angles: &SidedSeries,
        ankle_angles: &SidedSeries,
        back_angles: &[f64],
    ) -> AnalysisResult<Metrics> {
        let require = |metric: &'static str, value: Option<f64>| match value {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(AnalysisError::NonFinite { metric }),
        };

        Ok(Metrics {
            depth_score: require("depth_score", self.depth_score(knee_angles))?,
            knee_symmetry: require(
                "knee_symmetry",
                symmetry(&knee_angles.left, &knee_angles.right),
            )?,
            hip_symmetry: require("hip_symmetry", symmetry(&hip_angles.left, &hip_angles.right))?,
            ankle_symmetry: require(
                "ankle_symmetry",
                symmetry(&ankle_angles.left, &ankle_angles.right),
            )?,
            stability_score: require("stability_score", self.stability_score(back_angles))?,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use squat_models::{BodyLandmark, LandmarkError};

    const SEGMENT: f64 = 0.2;

    fn p(x: f64, y: f64) -> Landmark {
        Landmark::new(x, y, 0.0)
    }

    /// Thigh endpoint for a knee at `knee` with the shin hanging straight
    /// down, such that the knee angle is `knee_angle` degrees.
    fn hip_for_knee_angle(knee: Landmark, knee_angle: f64) -> Landmark {
        let bearing = (90.0 - knee_angle).to_radians();
        p(knee.x + SEGMENT * bearing.cos(), knee.y + SEGMENT * bearing.sin())
    }

    /// A frame with the shins vertical and the given knee angles.
    pub(crate) fn squat_frame(left_knee_angle: f64, right_knee_angle: f64) -> PoseFrame {
        let left_knee = p(0.45, 0.75);
        let right_knee = p(0.55, 0.75);
        let left_hip = hip_for_knee_angle(left_knee, left_knee_angle);
        let right_hip = hip_for_knee_angle(right_knee, right_knee_angle);
        PoseFrame {
            left_shoulder: p(left_hip.x, left_hip.y - 0.25),
            right_shoulder: p(right_hip.x, right_hip.y - 0.25),
            left_hip,
            right_hip,
            left_knee,
            right_knee,
            left_ankle: p(0.45, 0.95),
            right_ankle: p(0.55, 0.95),
        }
    }

    /// Upright, legs straight, everything stacked vertically.
    pub(crate) fn standing_frame() -> PoseFrame {
        squat_frame(180.0, 180.0)
    }

    fn raw_from(frame: &PoseFrame) -> RawFrame {
        let mut raw = vec![Landmark::default(); 33];
        for landmark in BodyLandmark::ALL {
            raw[landmark.index()] = frame.get(landmark);
        }
        raw
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let extractor = PoseMetricsExtractor::default();
        assert_eq!(extractor.extract(&[]), Err(AnalysisError::EmptySequence));
        assert_eq!(extractor.extract_raw(&[]), Err(AnalysisError::EmptySequence));
    }

    #[test]
    fn test_malformed_frame_reports_position() {
        let extractor = PoseMetricsExtractor::default();
        let good = raw_from(&standing_frame());
        let mut short = good.clone();
        short.truncate(27);

        let err = extractor.extract_raw(&[good.clone(), good, short]).unwrap_err();
        match err {
            AnalysisError::MalformedInput { frame, source } => {
                assert_eq!(frame, 2);
                assert!(matches!(
                    source,
                    LandmarkError::Missing {
                        landmark: BodyLandmark::LeftAnkle,
                        ..
                    }
                ));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_single_standing_frame() {
        let extractor = PoseMetricsExtractor::default();
        let analysis = extractor.extract(&[standing_frame()]).unwrap();

        assert_eq!(analysis.frame_count, 1);
        assert!((analysis.knee_angles.left[0] - 180.0).abs() < 1e-6);
        assert!((analysis.knee_angles.right[0] - 180.0).abs() < 1e-6);
        assert!((analysis.metrics.depth_score - 2.0).abs() < 1e-6);
        assert!(analysis.knee_velocities.is_empty());
        assert!(analysis.hip_velocities.is_empty());
        assert_eq!(analysis.metrics.knee_symmetry, 1.0);
        assert_eq!(analysis.metrics.stability_score, 1.0);
    }

    #[test]
    fn test_standing_frame_angles() {
        let extractor = PoseMetricsExtractor::default();
        let angles = extractor.frame_angles(&standing_frame());

        assert!((angles.hip_left - 180.0).abs() < 1e-6);
        // Shin and the synthetic point both sit straight above the ankle.
        assert!(angles.ankle_left.abs() < 1e-6);
        // A perfectly vertical torso is collinear with the reference point,
        // which this measure reports as 90.
        assert!((angles.back - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_ankle_reference_offset_sign() {
        let extractor = PoseMetricsExtractor::default();
        let mut frame = standing_frame();
        // Shin tilted 45 degrees forward.
        frame.left_knee = p(frame.left_ankle.x + 0.1, frame.left_ankle.y - 0.1);
        let angles = extractor.frame_angles(&frame);
        assert!((angles.ankle_left - 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_horizontal_torso_has_zero_back_angle() {
        let extractor = PoseMetricsExtractor::default();
        let mut frame = standing_frame();
        frame.left_shoulder = p(0.2, 0.55);
        frame.right_shoulder = p(0.2, 0.55);
        let angles = extractor.frame_angles(&frame);
        assert!(angles.back.abs() < 1e-6, "got {}", angles.back);
    }

    #[test]
    fn test_identical_frames_have_zero_velocity() {
        let extractor = PoseMetricsExtractor::default();
        let frame = squat_frame(120.0, 120.0);
        let analysis = extractor.extract(&[frame, frame]).unwrap();

        assert_eq!(analysis.knee_velocities, vec![0.0]);
        assert_eq!(analysis.hip_velocities, vec![0.0]);
    }

    #[test]
    fn test_velocity_scaled_by_frame_rate() {
        let extractor = PoseMetricsExtractor::default();
        let first = standing_frame();
        let mut second = first;
        second.left_knee.y += 0.01;
        second.right_knee.y += 0.03;
        second.left_hip.z += 0.02;

        let analysis = extractor.extract(&[first, second]).unwrap();
        assert!((analysis.knee_velocities[0] - (0.01 + 0.03) / 2.0 * 30.0).abs() < 1e-9);
        assert!((analysis.hip_velocities[0] - 0.02 / 2.0 * 30.0).abs() < 1e-9);
        assert_eq!(analysis.knee_velocities.len(), analysis.knee_angles.len() - 1);
    }

    #[test]
    fn test_knee_symmetry_from_uneven_frames() {
        let extractor = PoseMetricsExtractor::default();
        let frame = squat_frame(90.0, 45.0);
        let analysis = extractor.extract(&[frame, frame]).unwrap();

        assert!((analysis.knee_angles.left[0] - 90.0).abs() < 1e-6);
        assert!((analysis.knee_angles.right[0] - 45.0).abs() < 1e-6);
        assert!((analysis.metrics.knee_symmetry - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_symmetry_formula() {
        assert_eq!(symmetry(&[90.0, 90.0], &[45.0, 45.0]), Some(0.75));
        assert_eq!(symmetry(&[10.0, 170.0, 33.3], &[10.0, 170.0, 33.3]), Some(1.0));
        assert_eq!(symmetry(&[], &[]), None);
        assert_eq!(symmetry(&[1.0], &[]), None);
    }

    #[test]
    fn test_depth_score_tracks_min_knee_angle() {
        let extractor = PoseMetricsExtractor::default();
        let mut previous = None;
        for angle in [170.0, 140.0, 110.0, 90.0, 70.0, 50.0] {
            let analysis = extractor
                .extract(&[standing_frame(), squat_frame(angle, angle + 5.0), standing_frame()])
                .unwrap();
            let depth = analysis.metrics.depth_score;
            assert!((depth - angle / 90.0).abs() < 1e-6);
            if let Some(prev) = previous {
                assert!(depth < prev, "depth score should move with the minimum knee angle");
            }
            previous = Some(depth);
        }
    }

    #[test]
    fn test_steady_back_angle_is_fully_stable() {
        let extractor = PoseMetricsExtractor::default();
        assert_eq!(extractor.stability_score(&[20.0, 20.0, 20.0]), Some(1.0));
        // stddev 45 maps to zero stability.
        assert_eq!(extractor.stability_score(&[0.0, 90.0]), Some(0.0));
    }

    #[test]
    fn test_overflowing_coordinate_rejected() {
        let extractor = PoseMetricsExtractor::default();
        let first = standing_frame();
        let mut second = first;
        second.left_knee.x = 1e200;

        assert_eq!(
            extractor.extract(&[first, second]),
            Err(AnalysisError::NonFinite {
                metric: "knee_velocities"
            })
        );
    }

    #[test]
    fn test_non_finite_frame_rejected_without_partial_output() {
        let extractor = PoseMetricsExtractor::default();
        let mut frame = standing_frame();
        frame.left_knee.x = f64::NAN;
        let err = extractor.extract(&[frame]).unwrap_err();
        assert!(matches!(err, AnalysisError::NonFinite { .. }));
    }
}

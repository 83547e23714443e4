//! Squat form classification.
//!
//! Runs four independent rule checks against a [`PoseAnalysis`] (depth,
//! left/right symmetry, torso stability, pace consistency), then combines
//! the summary metrics into a single form score.

use squat_models::{FormClassification, Metrics, PoseAnalysis};
use tracing::debug;

use crate::config::ClassifierConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::stats;

/// Feedback appended when no check raised an issue.
pub const EXCELLENT_FORM_MESSAGE: &str = "Excellent form! Keep up the great work!";

/// A form problem raised by one of the checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormIssue {
    /// Depth score below the mild threshold.
    ShallowDepth,
    /// Depth score below the severe threshold.
    InsufficientDepth,
    KneeAsymmetry,
    HipAsymmetry,
    AnkleAsymmetry,
    /// Torso angle varies too much across the sequence.
    Instability,
    /// Peak back angle above the tolerated lean.
    ForwardLean,
    /// Peak back angle above the severe lean threshold.
    SevereForwardLean,
    /// Knee speed varies too much between frames.
    InconsistentPace,
}

impl FormIssue {
    /// Stable identifier for logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormIssue::ShallowDepth => "shallow_depth",
            FormIssue::InsufficientDepth => "insufficient_depth",
            FormIssue::KneeAsymmetry => "knee_asymmetry",
            FormIssue::HipAsymmetry => "hip_asymmetry",
            FormIssue::AnkleAsymmetry => "ankle_asymmetry",
            FormIssue::Instability => "instability",
            FormIssue::ForwardLean => "forward_lean",
            FormIssue::SevereForwardLean => "severe_forward_lean",
            FormIssue::InconsistentPace => "inconsistent_pace",
        }
    }

    /// Coaching text shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            FormIssue::ShallowDepth => {
                "Try to squat slightly deeper while maintaining form. Aim for thighs parallel to the ground."
            }
            FormIssue::InsufficientDepth => {
                "Squat depth is significantly insufficient. Focus on hip mobility and ankle flexibility to achieve greater depth."
            }
            FormIssue::KneeAsymmetry => {
                "Uneven knee movement detected. Focus on distributing weight equally between both legs."
            }
            FormIssue::HipAsymmetry => {
                "Hip alignment needs improvement. Ensure both hips are moving at the same height and pace."
            }
            FormIssue::AnkleAsymmetry => {
                "Ankle mobility differs between sides. Work on ankle mobility exercises to improve balance."
            }
            FormIssue::Instability => {
                "Movement shows instability. Focus on controlling the descent and maintaining a steady pace."
            }
            FormIssue::ForwardLean => {
                "Slight forward lean observed. Try to keep your torso more upright throughout the movement."
            }
            FormIssue::SevereForwardLean => {
                "Significant forward lean detected. Keep your chest up and focus on maintaining a more upright torso."
            }
            FormIssue::InconsistentPace => {
                "Movement speed is inconsistent. Try to maintain a more controlled, steady pace throughout the squat."
            }
        }
    }
}

/// Threshold-based squat form classifier.
#[derive(Debug, Clone, Default)]
pub struct FormClassifier {
    config: ClassifierConfig,
}

impl FormClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// At most one depth issue; the severe wording replaces the mild one.
    pub fn check_depth(&self, depth_score: f64) -> Option<FormIssue> {
        if depth_score >= self.config.depth {
            None
        } else if depth_score < self.config.severe_depth {
            Some(FormIssue::InsufficientDepth)
        } else {
            Some(FormIssue::ShallowDepth)
        }
    }

    /// One issue per joint pair below its symmetry threshold, knee-hip-ankle order.
    pub fn check_symmetry(&self, metrics: &Metrics) -> Vec<FormIssue> {
        [
            (metrics.knee_symmetry, self.config.knee_symmetry, FormIssue::KneeAsymmetry),
            (metrics.hip_symmetry, self.config.hip_symmetry, FormIssue::HipAsymmetry),
            (metrics.ankle_symmetry, self.config.ankle_symmetry, FormIssue::AnkleAsymmetry),
        ]
        .into_iter()
        .filter(|(score, threshold, _)| score < threshold)
        .map(|(_, _, issue)| issue)
        .collect()
    }

    /// Stability score and peak torso lean are judged independently.
    pub fn check_stability(&self, stability_score: f64, max_back_angle: Option<f64>) -> Vec<FormIssue> {
        let mut issues = Vec::new();
        if stability_score < self.config.stability {
            issues.push(FormIssue::Instability);
        }
        if let Some(max_back) = max_back_angle {
            if max_back > self.config.back_angle {
                issues.push(if max_back > self.config.severe_back_angle {
                    FormIssue::SevereForwardLean
                } else {
                    FormIssue::ForwardLean
                });
            }
        }
        issues
    }

    /// Pace check on knee velocities only.
    ///
    /// Skipped when the series is empty or its mean is zero, since the
    /// coefficient of variation is undefined there.
    // TODO: hip velocities are extracted alongside knee velocities but never
    // gate feedback here; decide whether hip pace should be checked too.
    pub fn check_velocity(&self, knee_velocities: &[f64]) -> Option<FormIssue> {
        let variation = stats::coefficient_of_variation(knee_velocities)?;
        (variation > self.config.velocity_variation).then_some(FormIssue::InconsistentPace)
    }

    /// All issues for an analysis, in check order.
    pub fn issues(&self, analysis: &PoseAnalysis) -> Vec<FormIssue> {
        let metrics = &analysis.metrics;
        let mut issues = Vec::new();
        issues.extend(self.check_depth(metrics.depth_score));
        issues.extend(self.check_symmetry(metrics));
        issues.extend(self.check_stability(metrics.stability_score, analysis.max_back_angle()));
        issues.extend(self.check_velocity(&analysis.knee_velocities));
        issues
    }

    /// Unweighted mean of depth, knee symmetry, hip symmetry and stability.
    ///
    /// Ankle symmetry is checked but not part of the score.
    pub fn form_score(metrics: &Metrics) -> f64 {
        (metrics.depth_score + metrics.knee_symmetry + metrics.hip_symmetry + metrics.stability_score)
            / 4.0
    }

    /// Classify an analysis into a verdict with ordered feedback.
    pub fn classify(&self, analysis: &PoseAnalysis) -> AnalysisResult<FormClassification> {
        for (metric, value) in analysis.metrics.named() {
            if !value.is_finite() {
                return Err(AnalysisError::NonFinite { metric });
            }
        }
        if analysis.back_angles.is_empty() {
            return Err(AnalysisError::EmptySequence);
        }

        let issues = self.issues(analysis);
        let form_score = Self::form_score(&analysis.metrics);
        let is_good =
            form_score >= self.config.good_form_score && issues.len() <= self.config.max_feedback_for_good;

        debug!(
            form_score,
            is_good,
            issues = ?issues.iter().map(FormIssue::as_str).collect::<Vec<_>>(),
            "Classified squat form"
        );

        let mut feedback: Vec<String> = issues.iter().map(|i| i.message().to_string()).collect();
        if feedback.is_empty() {
            feedback.push(EXCELLENT_FORM_MESSAGE.to_string());
        }

        Ok(FormClassification {
            is_good,
            confidence: form_score,
            feedback,
            detailed_metrics: analysis.metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::tests::{squat_frame, standing_frame};
    use crate::extractor::PoseMetricsExtractor;
    use squat_models::SidedSeries;

    fn metrics(depth: f64, knee: f64, hip: f64, ankle: f64, stability: f64) -> Metrics {
        Metrics {
            depth_score: depth,
            knee_symmetry: knee,
            hip_symmetry: hip,
            ankle_symmetry: ankle,
            stability_score: stability,
        }
    }

    fn analysis(metrics: Metrics, back_angles: Vec<f64>, knee_velocities: Vec<f64>) -> PoseAnalysis {
        let n = back_angles.len();
        PoseAnalysis {
            frame_count: n,
            knee_angles: SidedSeries::default(),
            hip_angles: SidedSeries::default(),
            ankle_angles: SidedSeries::default(),
            back_angles,
            hip_velocities: vec![0.0; knee_velocities.len()],
            knee_velocities,
            metrics,
        }
    }

    fn clean() -> PoseAnalysis {
        analysis(metrics(1.0, 1.0, 1.0, 1.0, 1.0), vec![10.0, 12.0], vec![1.0])
    }

    #[test]
    fn test_depth_wording_is_exclusive() {
        let classifier = FormClassifier::default();
        assert_eq!(classifier.check_depth(0.85), None);
        assert_eq!(classifier.check_depth(0.8), None);
        assert_eq!(classifier.check_depth(0.7), Some(FormIssue::ShallowDepth));
        assert_eq!(classifier.check_depth(0.6), Some(FormIssue::ShallowDepth));
        assert_eq!(classifier.check_depth(0.59), Some(FormIssue::InsufficientDepth));
    }

    #[test]
    fn test_symmetry_checks_each_joint() {
        let classifier = FormClassifier::default();
        assert!(classifier.check_symmetry(&metrics(1.0, 0.9, 0.9, 0.9, 1.0)).is_empty());
        assert_eq!(
            classifier.check_symmetry(&metrics(1.0, 0.5, 0.9, 0.84, 1.0)),
            vec![FormIssue::KneeAsymmetry, FormIssue::AnkleAsymmetry]
        );
        assert_eq!(classifier.check_symmetry(&metrics(1.0, 0.1, 0.1, 0.1, 1.0)).len(), 3);
    }

    #[test]
    fn test_stability_and_lean() {
        let classifier = FormClassifier::default();
        assert!(classifier.check_stability(0.9, Some(30.0)).is_empty());
        assert_eq!(classifier.check_stability(0.9, Some(35.0)), vec![FormIssue::ForwardLean]);
        assert_eq!(classifier.check_stability(0.9, Some(45.0)), vec![FormIssue::ForwardLean]);
        assert_eq!(
            classifier.check_stability(0.5, Some(60.0)),
            vec![FormIssue::Instability, FormIssue::SevereForwardLean]
        );
    }

    #[test]
    fn test_velocity_check_guards_degenerate_series() {
        let classifier = FormClassifier::default();
        assert_eq!(classifier.check_velocity(&[]), None);
        assert_eq!(classifier.check_velocity(&[0.0, 0.0]), None);
        assert_eq!(classifier.check_velocity(&[1.0, 1.1, 0.9]), None);
        assert_eq!(
            classifier.check_velocity(&[0.1, 2.0, 0.1, 2.0]),
            Some(FormIssue::InconsistentPace)
        );
    }

    #[test]
    fn test_excellent_form() {
        let classification = FormClassifier::default().classify(&clean()).unwrap();
        assert!(classification.is_good);
        assert_eq!(classification.confidence, 1.0);
        assert_eq!(classification.feedback, vec![EXCELLENT_FORM_MESSAGE.to_string()]);
        assert_eq!(classification.detailed_metrics, clean().metrics);
    }

    #[test]
    fn test_single_note_still_good() {
        let input = analysis(metrics(1.0, 1.0, 1.0, 0.5, 1.0), vec![10.0], vec![]);
        let classification = FormClassifier::default().classify(&input).unwrap();
        assert!(classification.is_good);
        assert_eq!(classification.feedback, vec![FormIssue::AnkleAsymmetry.message().to_string()]);
    }

    #[test]
    fn test_two_notes_fail_despite_high_score() {
        let input = analysis(metrics(2.0, 1.0, 1.0, 0.5, 1.0), vec![10.0, 40.0], vec![]);
        let classification = FormClassifier::default().classify(&input).unwrap();
        assert!(classification.confidence >= 0.8);
        assert_eq!(classification.feedback.len(), 2);
        assert!(!classification.is_good);
    }

    #[test]
    fn test_low_score_fails_without_feedback_issues() {
        // Every check passes yet the averaged score stays below 0.8.
        let input = analysis(metrics(0.8, 0.86, 0.86, 1.0, 0.3), vec![10.0], vec![]);
        let classifier = FormClassifier::new(ClassifierConfig {
            stability: 0.0,
            ..ClassifierConfig::default()
        });
        let classification = classifier.classify(&input).unwrap();
        assert!(classification.confidence < 0.8);
        assert!(!classification.is_good);
        assert_eq!(classification.feedback, vec![EXCELLENT_FORM_MESSAGE.to_string()]);
    }

    #[test]
    fn test_ankle_symmetry_excluded_from_score() {
        let a = FormClassifier::form_score(&metrics(0.9, 0.9, 0.9, 1.0, 0.9));
        let b = FormClassifier::form_score(&metrics(0.9, 0.9, 0.9, 0.0, 0.9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_feedback_order_follows_checks() {
        let input = analysis(
            metrics(0.5, 0.5, 1.0, 1.0, 0.5),
            vec![0.0, 50.0],
            vec![0.1, 3.0, 0.1],
        );
        let classification = FormClassifier::default().classify(&input).unwrap();
        let expected: Vec<String> = [
            FormIssue::InsufficientDepth,
            FormIssue::KneeAsymmetry,
            FormIssue::Instability,
            FormIssue::SevereForwardLean,
            FormIssue::InconsistentPace,
        ]
        .iter()
        .map(|i| i.message().to_string())
        .collect();
        assert_eq!(classification.feedback, expected);
        assert!(!classification.is_good);
    }

    #[test]
    fn test_rejects_non_finite_metrics() {
        let input = analysis(metrics(f64::NAN, 1.0, 1.0, 1.0, 1.0), vec![10.0], vec![]);
        assert_eq!(
            FormClassifier::default().classify(&input),
            Err(AnalysisError::NonFinite { metric: "depth_score" })
        );
    }

    #[test]
    fn test_standing_frame_has_no_depth_complaint() {
        let analysis = PoseMetricsExtractor::default().extract(&[standing_frame()]).unwrap();
        let classification = FormClassifier::default().classify(&analysis).unwrap();
        let depth_messages = [
            FormIssue::ShallowDepth.message(),
            FormIssue::InsufficientDepth.message(),
        ];
        assert!(!classification.feedback.iter().any(|f| depth_messages.contains(&f.as_str())));
        assert!(!classification.feedback.is_empty());
    }

    #[test]
    fn test_motionless_frames_skip_pace_check() {
        let frame = squat_frame(85.0, 85.0);
        let analysis = PoseMetricsExtractor::default().extract(&[frame, frame, frame]).unwrap();
        assert!(analysis.knee_velocities.iter().all(|v| *v == 0.0));

        let classification = FormClassifier::default().classify(&analysis).unwrap();
        assert!(!classification
            .feedback
            .contains(&FormIssue::InconsistentPace.message().to_string()));
    }

    #[test]
    fn test_uneven_knees_raise_knee_feedback() {
        let frame = squat_frame(90.0, 45.0);
        let analysis = PoseMetricsExtractor::default().extract(&[frame, frame]).unwrap();
        let classification = FormClassifier::default().classify(&analysis).unwrap();
        assert!(classification
            .feedback
            .contains(&FormIssue::KneeAsymmetry.message().to_string()));
        assert!(!classification.is_good);
    }
}

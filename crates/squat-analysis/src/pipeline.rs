//! End-to-end analysis: raw landmark frames to analysis plus verdict.

use squat_models::{AnalysisResponse, RawFrame};
use tracing::debug;

use crate::classifier::FormClassifier;
use crate::config::AnalysisConfig;
use crate::error::AnalysisResult;
use crate::extractor::PoseMetricsExtractor;

/// Extractor and classifier bundled behind one immutable configuration.
///
/// Holds no per-request state, so a single instance can serve concurrent
/// requests behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SquatAnalyzer {
    extractor: PoseMetricsExtractor,
    classifier: FormClassifier,
}

impl SquatAnalyzer {
    /// Create an analyzer, rejecting configurations that cannot produce
    /// meaningful scores.
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self {
            extractor: PoseMetricsExtractor::new(config.extractor),
            classifier: FormClassifier::new(config.classifier),
        })
    }

    pub fn extractor(&self) -> &PoseMetricsExtractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &FormClassifier {
        &self.classifier
    }

    /// Extract metrics from raw frames and classify them.
    ///
    /// Classification only runs once extraction has fully succeeded.
    pub fn analyze(&self, frames: &[RawFrame]) -> AnalysisResult<AnalysisResponse> {
        let analysis = self.extractor.extract_raw(frames)?;
        let classification = self.classifier.classify(&analysis)?;
        debug!(
            frames = analysis.frame_count,
            is_good = classification.is_good,
            feedback = classification.feedback.len(),
            "Squat analysis complete"
        );
        Ok(AnalysisResponse::new(analysis, classification))
    }
}

/// One-shot analysis with an explicit configuration.
pub fn analyze_frames(frames: &[RawFrame], config: &AnalysisConfig) -> AnalysisResult<AnalysisResponse> {
    SquatAnalyzer::new(*config)?.analyze(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, ErrorKind};
    use crate::extractor::tests::{squat_frame, standing_frame};
    use squat_models::{BodyLandmark, Landmark, PoseFrame};

    fn raw(frame: &PoseFrame) -> RawFrame {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); 33];
        for landmark in BodyLandmark::ALL {
            landmarks[landmark.index()] = frame.get(landmark);
        }
        landmarks
    }

    #[test]
    fn test_analyze_rep() {
        let analyzer = SquatAnalyzer::default();
        let frames: Vec<RawFrame> = [180.0, 150.0, 120.0, 95.0, 70.0, 95.0, 120.0, 150.0, 180.0]
            .iter()
            .map(|angle| raw(&squat_frame(*angle, *angle)))
            .collect();

        let response = analyzer.analyze(&frames).unwrap();
        assert!(response.success);
        assert_eq!(response.analysis.frame_count, 9);
        assert_eq!(response.analysis.knee_velocities.len(), 8);
        assert!(!response.classification.feedback.is_empty());
        assert_eq!(response.classification.detailed_metrics, response.analysis.metrics);
    }

    #[test]
    fn test_empty_input_never_classified() {
        let err = SquatAnalyzer::default().analyze(&[]).unwrap_err();
        assert_eq!(err, AnalysisError::EmptySequence);
        assert_eq!(err.kind(), ErrorKind::NoPoseData);
    }

    #[test]
    fn test_truncated_frame_is_malformed() {
        let mut frame = raw(&standing_frame());
        frame.truncate(20);
        let err = SquatAnalyzer::default().analyze(&[frame]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedPoseData);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AnalysisConfig::default();
        config.extractor.stability_reference_angle = -1.0;
        assert!(SquatAnalyzer::new(config).is_err());
    }

    #[test]
    fn test_analyze_frames_honours_config() {
        let frame = raw(&squat_frame(90.0, 90.0));
        let frames = vec![frame.clone(), frame];

        let mut config = AnalysisConfig::default();
        config.extractor.depth_reference_angle = 45.0;
        let response = analyze_frames(&frames, &config).unwrap();
        assert!((response.analysis.metrics.depth_score - 2.0).abs() < 1e-6);

        config.extractor.frame_rate = 0.0;
        assert!(matches!(
            analyze_frames(&frames, &config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_shared_across_threads() {
        let analyzer = std::sync::Arc::new(SquatAnalyzer::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let analyzer = std::sync::Arc::clone(&analyzer);
                std::thread::spawn(move || {
                    let angle = 60.0 + 20.0 * i as f64;
                    let frame = raw(&squat_frame(angle, angle));
                    analyzer.analyze(&[frame.clone(), frame]).unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let response = handle.join().unwrap();
            let expected = (60.0 + 20.0 * i as f64) / 90.0;
            assert!((response.analysis.metrics.depth_score - expected).abs() < 1e-6);
        }
    }
}

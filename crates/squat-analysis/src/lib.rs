//! Squat form analysis from pose landmark sequences.
//!
//! This crate provides:
//! - Joint angle, velocity, symmetry, depth and stability extraction
//! - Threshold-based form classification with ordered feedback
//! - Tunable thresholds and approximation constants
//!
//! Everything here is a pure function of its input. Extractors and
//! classifiers hold only immutable configuration and can be shared across
//! threads freely.

pub mod classifier;
pub mod config;
pub mod error;
pub mod extractor;
pub mod geometry;
pub mod pipeline;
pub mod stats;

pub use classifier::{FormClassifier, FormIssue, EXCELLENT_FORM_MESSAGE};
pub use config::{AnalysisConfig, ClassifierConfig, ExtractorConfig};
pub use error::{AnalysisError, AnalysisResult, ErrorKind};
pub use extractor::{FrameAngles, PoseMetricsExtractor};
pub use geometry::joint_angle;
pub use pipeline::{analyze_frames, SquatAnalyzer};

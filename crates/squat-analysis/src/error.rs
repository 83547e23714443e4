//! Error types for pose analysis.

use squat_models::LandmarkError;
use thiserror::Error;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors that can occur during pose analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("No pose frames supplied")]
    EmptySequence,

    #[error("Malformed pose data in frame {frame}: {source}")]
    MalformedInput {
        frame: usize,
        #[source]
        source: LandmarkError,
    },

    #[error("Computed {metric} is not a finite number")]
    NonFinite { metric: &'static str },

    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse failure category, used by the service layer to pick a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoPoseData,
    MalformedPoseData,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoPoseData => "no_pose_data",
            ErrorKind::MalformedPoseData => "malformed_pose_data",
            ErrorKind::Internal => "analysis_failed",
        }
    }
}

impl AnalysisError {
    pub fn malformed(frame: usize, source: LandmarkError) -> Self {
        Self::MalformedInput { frame, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::EmptySequence => ErrorKind::NoPoseData,
            AnalysisError::MalformedInput { .. } => ErrorKind::MalformedPoseData,
            AnalysisError::NonFinite { .. } | AnalysisError::InvalidConfig(_) => ErrorKind::Internal,
        }
    }
}

//! Shared data models for the squat form analyzer.
//!
//! This crate provides Serde-serializable types for:
//! - Pose landmarks and named body keypoints
//! - Per-sequence pose analysis (angle/velocity series and summary metrics)
//! - Form classification results
//! - WebSocket message schemas

pub mod analysis;
pub mod classification;
pub mod landmark;
pub mod ws;

// Re-export common types
pub use analysis::{Metrics, PoseAnalysis, SidedSeries};
pub use classification::{AnalysisResponse, FormClassification};
pub use landmark::{BodyLandmark, Landmark, LandmarkError, PoseFrame, RawFrame};
pub use ws::{WsClientMessage, WsErrorCode, WsMessage, WsMessageType};

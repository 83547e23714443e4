//! WebSocket message types for live analysis mode.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::PoseAnalysis;
use crate::classification::{AnalysisResponse, FormClassification};
use crate::landmark::RawFrame;

/// Server-to-client message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    ConnectionStatus,
    PoseAnalysis,
    Error,
}

impl WsMessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WsMessageType::ConnectionStatus => "connection_status",
            WsMessageType::PoseAnalysis => "pose_analysis",
            WsMessageType::Error => "error",
        }
    }
}

/// Failure category reported to live-mode clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WsErrorCode {
    /// No frames were supplied.
    NoPoseData,
    /// A frame was missing a required landmark or had bad coordinates.
    MalformedPoseData,
    /// The message itself could not be parsed.
    InvalidMessage,
    /// Analysis produced an unusable result.
    AnalysisFailed,
}

impl WsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WsErrorCode::NoPoseData => "no_pose_data",
            WsErrorCode::MalformedPoseData => "malformed_pose_data",
            WsErrorCode::InvalidMessage => "invalid_message",
            WsErrorCode::AnalysisFailed => "analysis_failed",
        }
    }
}

/// Server-to-client WebSocket envelope.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Sent once after the socket is upgraded.
    ConnectionStatus { status: String },

    /// Analysis of the current live window.
    PoseAnalysis {
        success: bool,
        analysis: PoseAnalysis,
        classification: FormClassification,
    },

    /// A message could not be analysed; the connection stays open.
    Error {
        message: String,
        code: WsErrorCode,
        timestamp: DateTime<Utc>,
    },
}

impl WsMessage {
    pub fn connected() -> Self {
        WsMessage::ConnectionStatus {
            status: "connected".to_string(),
        }
    }

    pub fn pose_analysis(response: AnalysisResponse) -> Self {
        WsMessage::PoseAnalysis {
            success: response.success,
            analysis: response.analysis,
            classification: response.classification,
        }
    }

    /// Create an error message.
    pub fn error(code: WsErrorCode, message: impl Into<String>) -> Self {
        WsMessage::Error {
            message: message.into(),
            code,
            timestamp: Utc::now(),
        }
    }

    pub fn message_type(&self) -> WsMessageType {
        match self {
            WsMessage::ConnectionStatus { .. } => WsMessageType::ConnectionStatus,
            WsMessage::PoseAnalysis { .. } => WsMessageType::PoseAnalysis,
            WsMessage::Error { .. } => WsMessageType::Error,
        }
    }
}

/// Client-to-server WebSocket messages.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientMessage {
    /// Landmarks detected in one captured frame.
    ProcessFrame { landmarks: RawFrame },

    /// A complete sequence, analysed on its own without touching the live window.
    ProcessSequence { frames: Vec<RawFrame> },

    /// Drop all frames buffered for this connection.
    Reset,
}

//! Pose landmark types.
//!
//! The pose estimator emits a flat list of 33 keypoints per frame. Only the
//! lower-body chain plus the shoulders is consumed here, and it is lifted into
//! a named-field [`PoseFrame`] at the boundary so nothing downstream indexes
//! into the raw list.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A 3D keypoint in normalized image coordinates (x, y in roughly 0..1, z is
/// relative depth).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, JsonSchema)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Accepted wire forms: `[x, y, z]` as emitted by the pose model, or an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum LandmarkRepr {
    List([f64; 3]),
    Object {
        x: f64,
        y: f64,
        #[serde(default)]
        z: f64,
    },
}

impl From<LandmarkRepr> for Landmark {
    fn from(repr: LandmarkRepr) -> Self {
        match repr {
            LandmarkRepr::List([x, y, z]) => Landmark { x, y, z },
            LandmarkRepr::Object { x, y, z } => Landmark { x, y, z },
        }
    }
}

impl<'de> Deserialize<'de> for Landmark {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        LandmarkRepr::deserialize(deserializer).map(Landmark::from)
    }
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Whether every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One frame of raw landmarks, in pose-model index order.
pub type RawFrame = Vec<Landmark>;

/// Body keypoints consumed by the analyzer, with their pose-model indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BodyLandmark {
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl BodyLandmark {
    pub const ALL: [BodyLandmark; 8] = [
        BodyLandmark::LeftShoulder,
        BodyLandmark::RightShoulder,
        BodyLandmark::LeftHip,
        BodyLandmark::RightHip,
        BodyLandmark::LeftKnee,
        BodyLandmark::RightKnee,
        BodyLandmark::LeftAnkle,
        BodyLandmark::RightAnkle,
    ];

    /// Index of this keypoint in the pose model's landmark list.
    pub fn index(&self) -> usize {
        match self {
            BodyLandmark::LeftShoulder => 11,
            BodyLandmark::RightShoulder => 12,
            BodyLandmark::LeftHip => 23,
            BodyLandmark::RightHip => 24,
            BodyLandmark::LeftKnee => 25,
            BodyLandmark::RightKnee => 26,
            BodyLandmark::LeftAnkle => 27,
            BodyLandmark::RightAnkle => 28,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyLandmark::LeftShoulder => "left_shoulder",
            BodyLandmark::RightShoulder => "right_shoulder",
            BodyLandmark::LeftHip => "left_hip",
            BodyLandmark::RightHip => "right_hip",
            BodyLandmark::LeftKnee => "left_knee",
            BodyLandmark::RightKnee => "right_knee",
            BodyLandmark::LeftAnkle => "left_ankle",
            BodyLandmark::RightAnkle => "right_ankle",
        }
    }
}

impl std::fmt::Display for BodyLandmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised while lifting a raw landmark list into a [`PoseFrame`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    #[error("missing landmark {landmark} (index {index}); frame has {available} landmarks")]
    Missing {
        landmark: BodyLandmark,
        index: usize,
        available: usize,
    },

    #[error("landmark {landmark} has a non-finite coordinate")]
    NonFinite { landmark: BodyLandmark },
}

/// The keypoints of one frame that squat analysis needs, by name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PoseFrame {
    pub left_shoulder: Landmark,
    pub right_shoulder: Landmark,
    pub left_hip: Landmark,
    pub right_hip: Landmark,
    pub left_knee: Landmark,
    pub right_knee: Landmark,
    pub left_ankle: Landmark,
    pub right_ankle: Landmark,
}

impl PoseFrame {
    /// Build a frame from a raw pose-model landmark list.
    ///
    /// Fails on the first consumed keypoint that is absent or not finite;
    /// no default is ever substituted.
    pub fn from_landmarks(landmarks: &[Landmark]) -> Result<Self, LandmarkError> {
        let pick = |landmark: BodyLandmark| -> Result<Landmark, LandmarkError> {
            let index = landmark.index();
            let point = landmarks.get(index).copied().ok_or(LandmarkError::Missing {
                landmark,
                index,
                available: landmarks.len(),
            })?;
            if !point.is_finite() {
                return Err(LandmarkError::NonFinite { landmark });
            }
            Ok(point)
        };

        Ok(Self {
            left_shoulder: pick(BodyLandmark::LeftShoulder)?,
            right_shoulder: pick(BodyLandmark::RightShoulder)?,
            left_hip: pick(BodyLandmark::LeftHip)?,
            right_hip: pick(BodyLandmark::RightHip)?,
            left_knee: pick(BodyLandmark::LeftKnee)?,
            right_knee: pick(BodyLandmark::RightKnee)?,
            left_ankle: pick(BodyLandmark::LeftAnkle)?,
            right_ankle: pick(BodyLandmark::RightAnkle)?,
        })
    }

    /// Look up a keypoint by name.
    pub fn get(&self, landmark: BodyLandmark) -> Landmark {
        match landmark {
            BodyLandmark::LeftShoulder => self.left_shoulder,
            BodyLandmark::RightShoulder => self.right_shoulder,
            BodyLandmark::LeftHip => self.left_hip,
            BodyLandmark::RightHip => self.right_hip,
            BodyLandmark::LeftKnee => self.left_knee,
            BodyLandmark::RightKnee => self.right_knee,
            BodyLandmark::LeftAnkle => self.left_ankle,
            BodyLandmark::RightAnkle => self.right_ankle,
        }
    }
}

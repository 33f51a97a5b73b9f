use serde::{Deserialize, Serialize};

/// Number of body landmarks emitted per frame by the pose model.
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Landmark indices used by the posture checks, following the upstream
/// pose model's fixed 33-point convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEye = 2,
    RightEye = 5,
    LeftEar = 7,
    RightEar = 8,
    LeftShoulder = 11,
    RightShoulder = 12,
}

/// A single body keypoint in normalized frame coordinates. `visibility` is
/// the model's confidence that the point is correctly localized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    /// Fully visible landmark on the image plane.
    pub fn at(x: f32, y: f32) -> Self {
        Self::new(x, y, 0.0, 1.0)
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility > threshold
    }
}

/// One frame's worth of landmarks, in model index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmarks {
    points: Vec<Landmark>,
}

impl PoseLandmarks {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether all 33 model landmarks are present.
    pub fn is_complete(&self) -> bool {
        self.points.len() >= POSE_LANDMARK_COUNT
    }

    pub fn get(&self, index: LandmarkIndex) -> Option<Landmark> {
        self.points.get(index as usize).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.points.iter()
    }
}

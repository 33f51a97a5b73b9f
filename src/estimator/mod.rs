pub mod simulated;

use crate::common::{PoseLandmarks, VideoFrame};
use crate::error::EstimatorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use simulated::SimulatedEstimator;

/// Model complexity tier of the underlying pose model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelComplexity {
    Lite,
    Full,
    Heavy,
}

/// Configuration knobs of the external pose model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorOptions {
    pub model_complexity: ModelComplexity,
    pub smooth_landmarks: bool,
    pub enable_segmentation: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            model_complexity: ModelComplexity::Full,
            smooth_landmarks: true,
            enable_segmentation: false,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

/// Asynchronous frame-to-landmarks contract. Production pose libraries use
/// a configure/callback convention; this trait collapses that into a single
/// submit-and-await operation so the scheduler stays library-agnostic.
#[async_trait]
pub trait PoseEstimator: Send + Sync {
    /// Submit one frame. Resolves with the detected landmark set, or `None`
    /// when no pose was found in the frame.
    async fn estimate(&self, frame: &VideoFrame) -> Result<Option<PoseLandmarks>, EstimatorError>;
}

use super::{EstimatorOptions, PoseEstimator};
use crate::common::{Landmark, LandmarkIndex, PoseLandmarks, VideoFrame, POSE_LANDMARK_COUNT};
use crate::error::EstimatorError;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Estimator producing a well-posed, centered subject with a little random
/// jitter per frame. Stands in for the real pose model in the demo binary
/// and in session tests.
pub struct SimulatedEstimator {
    options: EstimatorOptions,
    jitter: f32,
    latency: Duration,
}

impl SimulatedEstimator {
    pub fn new(options: EstimatorOptions) -> Self {
        Self {
            options,
            jitter: 0.005,
            latency: Duration::from_millis(5),
        }
    }

    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn options(&self) -> &EstimatorOptions {
        &self.options
    }

    fn base_pose() -> Vec<Landmark> {
        let mut points = vec![Landmark::new(0.5, 0.7, 0.0, 0.9); POSE_LANDMARK_COUNT];
        points[LandmarkIndex::Nose as usize] = Landmark::new(0.5, 0.30, 0.0, 0.98);
        points[LandmarkIndex::LeftEye as usize] = Landmark::new(0.42, 0.28, 0.0, 0.97);
        points[LandmarkIndex::RightEye as usize] = Landmark::new(0.58, 0.28, 0.0, 0.97);
        points[LandmarkIndex::LeftEar as usize] = Landmark::new(0.40, 0.30, 0.0, 0.95);
        points[LandmarkIndex::RightEar as usize] = Landmark::new(0.60, 0.30, 0.0, 0.95);
        points[LandmarkIndex::LeftShoulder as usize] = Landmark::new(0.35, 0.55, 0.0, 0.96);
        points[LandmarkIndex::RightShoulder as usize] = Landmark::new(0.65, 0.55, 0.0, 0.96);
        points
    }
}

#[async_trait]
impl PoseEstimator for SimulatedEstimator {
    async fn estimate(
        &self,
        _frame: &VideoFrame,
    ) -> Result<Option<PoseLandmarks>, EstimatorError> {
        tokio::time::sleep(self.latency).await;

        let mut rng = rand::rng();
        let points = Self::base_pose()
            .into_iter()
            .map(|p| {
                Landmark::new(
                    p.x + rng.random_range(-self.jitter..=self.jitter),
                    p.y + rng.random_range(-self.jitter..=self.jitter),
                    p.z,
                    p.visibility,
                )
            })
            .collect();

        Ok(Some(PoseLandmarks::new(points)))
    }
}

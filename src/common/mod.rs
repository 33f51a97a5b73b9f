pub mod frame;
pub mod landmarks;

pub use frame::VideoFrame;
pub use landmarks::{Landmark, LandmarkIndex, PoseLandmarks, POSE_LANDMARK_COUNT};

pub mod analysis;
pub mod common;
pub mod config;
pub mod error;
pub mod estimator;
pub mod intake;
pub mod scheduler;
pub mod session;

pub use analysis::{AnalyzerThresholds, PostureAnalyzer, PostureAssessment, PostureWarning};
pub use common::{Landmark, LandmarkIndex, PoseLandmarks, VideoFrame};
pub use config::Configuration;
pub use error::{AppError, ConfigError, EstimatorError};
pub use estimator::{EstimatorOptions, PoseEstimator, SimulatedEstimator};
pub use intake::{SyntheticVideoSource, VideoSource};
pub use session::{PostureSession, PostureSessionBuilder};

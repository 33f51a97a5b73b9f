pub mod analyzer;
pub mod assessment;

pub use analyzer::{AnalyzerThresholds, PostureAnalyzer};
pub use assessment::{PostureAssessment, PostureWarning};

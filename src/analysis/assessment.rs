use serde::{Deserialize, Serialize};
use std::fmt;

/// A single coaching warning. Ordering in an assessment follows the fixed
/// checking order: head tilt, gaze, shoulders, distance, overall posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureWarning {
    HeadTilted,
    NotLookingAtCamera,
    ShouldersUneven,
    TooClose,
    TooFar,
    Slouching,
}

impl PostureWarning {
    /// User-facing coaching message.
    pub fn message(&self) -> &'static str {
        match self {
            PostureWarning::HeadTilted => "Keep your head straight",
            PostureWarning::NotLookingAtCamera => "Please look directly at the camera",
            PostureWarning::ShouldersUneven => "Keep your shoulders level",
            PostureWarning::TooClose => "Move back from the camera",
            PostureWarning::TooFar => "Move closer to the camera",
            PostureWarning::Slouching => "Sit up straight - maintain good posture",
        }
    }
}

impl fmt::Display for PostureWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Per-frame posture and engagement judgment. Recomputed wholesale for
/// every analyzed frame; no field carries history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureAssessment {
    pub is_good_posture: bool,
    pub is_looking_at_camera: bool,
    /// Eye-line angle relative to horizontal, in degrees.
    pub head_tilt_angle: f32,
    /// Absolute vertical offset between the shoulders, normalized units.
    pub shoulder_alignment: f32,
    /// Percentage of landmarks with visibility above the cutoff, 0-100.
    pub confidence: f32,
    pub warnings: Vec<PostureWarning>,
}

impl PostureAssessment {
    pub fn messages(&self) -> Vec<&'static str> {
        self.warnings.iter().map(PostureWarning::message).collect()
    }

    pub fn has_warning(&self, warning: PostureWarning) -> bool {
        self.warnings.contains(&warning)
    }
}

impl Default for PostureAssessment {
    fn default() -> Self {
        Self {
            is_good_posture: true,
            is_looking_at_camera: true,
            head_tilt_angle: 0.0,
            shoulder_alignment: 0.0,
            confidence: 0.0,
            warnings: Vec::new(),
        }
    }
}

use super::{PostureAssessment, PostureWarning};
use crate::common::{LandmarkIndex, PoseLandmarks};
use serde::{Deserialize, Serialize};

/// Geometric thresholds of the posture checks. The defaults are the
/// reference values; they are empirically chosen for a typical webcam
/// setup and exposed here so other camera geometries can retune them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerThresholds {
    /// Degrees of eye-line tilt tolerated before warning.
    pub max_head_tilt_degrees: f32,
    /// Horizontal nose deviation from the eye midpoint, normalized units.
    pub max_gaze_deviation: f32,
    /// Vertical shoulder offset tolerated before warning.
    pub max_shoulder_offset: f32,
    /// Interocular distance above which the subject is too close.
    pub too_close_eye_distance: f32,
    /// Interocular distance below which the subject is too far.
    pub too_far_eye_distance: f32,
    /// Minimum ear-above-shoulder gap for upright posture.
    pub min_ear_shoulder_gap: f32,
    /// Visibility cutoff for the confidence percentage.
    pub min_visibility: f32,
}

impl Default for AnalyzerThresholds {
    fn default() -> Self {
        Self {
            max_head_tilt_degrees: 15.0,
            max_gaze_deviation: 0.05,
            max_shoulder_offset: 0.05,
            too_close_eye_distance: 0.30,
            too_far_eye_distance: 0.10,
            min_ear_shoulder_gap: 0.10,
            min_visibility: 0.5,
        }
    }
}

/// Stateless per-frame posture analysis. `analyze` is a pure function of
/// the landmark set; callers keep the previous assessment when it returns
/// `None` (carry-forward on detection failure).
#[derive(Debug, Clone, Default)]
pub struct PostureAnalyzer {
    thresholds: AnalyzerThresholds,
}

impl PostureAnalyzer {
    pub fn new(thresholds: AnalyzerThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AnalyzerThresholds {
        &self.thresholds
    }

    pub fn analyze(&self, landmarks: &PoseLandmarks) -> Option<PostureAssessment> {
        if !landmarks.is_complete() {
            return None;
        }

        let t = &self.thresholds;
        let nose = landmarks.get(LandmarkIndex::Nose)?;
        let left_eye = landmarks.get(LandmarkIndex::LeftEye)?;
        let right_eye = landmarks.get(LandmarkIndex::RightEye)?;
        let left_ear = landmarks.get(LandmarkIndex::LeftEar)?;
        let right_ear = landmarks.get(LandmarkIndex::RightEar)?;
        let left_shoulder = landmarks.get(LandmarkIndex::LeftShoulder)?;
        let right_shoulder = landmarks.get(LandmarkIndex::RightShoulder)?;

        let mut warnings = Vec::new();

        // 1. Head tilt: eye-line angle against horizontal.
        let head_tilt_angle = (right_eye.y - left_eye.y)
            .atan2(right_eye.x - left_eye.x)
            .to_degrees();
        if head_tilt_angle.abs() >= t.max_head_tilt_degrees {
            warnings.push(PostureWarning::HeadTilted);
        }

        // 2. Gaze: nose should sit between the eyes.
        let eye_center_x = (left_eye.x + right_eye.x) / 2.0;
        let gaze_deviation = (nose.x - eye_center_x).abs();
        let is_looking_at_camera = gaze_deviation < t.max_gaze_deviation;
        if !is_looking_at_camera {
            warnings.push(PostureWarning::NotLookingAtCamera);
        }

        // 3. Shoulder alignment.
        let shoulder_alignment = (left_shoulder.y - right_shoulder.y).abs();
        if shoulder_alignment >= t.max_shoulder_offset {
            warnings.push(PostureWarning::ShouldersUneven);
        }

        // 4. Distance from camera, interocular distance as proxy.
        let eye_distance = (left_eye.x - right_eye.x).abs();
        if eye_distance > t.too_close_eye_distance {
            warnings.push(PostureWarning::TooClose);
        } else if eye_distance < t.too_far_eye_distance {
            warnings.push(PostureWarning::TooFar);
        }

        // 5. Overall posture: ears meaningfully above the shoulders.
        //    Normalized y grows downward, so "above" means smaller y.
        let avg_ear_y = (left_ear.y + right_ear.y) / 2.0;
        let avg_shoulder_y = (left_shoulder.y + right_shoulder.y) / 2.0;
        let is_good_posture =
            avg_ear_y < avg_shoulder_y && (avg_shoulder_y - avg_ear_y) > t.min_ear_shoulder_gap;
        if !is_good_posture {
            warnings.push(PostureWarning::Slouching);
        }

        // 6. Confidence: share of landmarks the model is sure about.
        let visible = landmarks
            .iter()
            .filter(|l| l.is_visible(t.min_visibility))
            .count();
        let confidence = (visible as f32 / landmarks.len() as f32) * 100.0;

        Some(PostureAssessment {
            is_good_posture,
            is_looking_at_camera,
            head_tilt_angle,
            shoulder_alignment,
            confidence,
            warnings,
        })
    }
}

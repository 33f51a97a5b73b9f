use crate::analysis::AnalyzerThresholds;
use crate::error::ConfigError;
use crate::estimator::EstimatorOptions;
use serde::Deserialize;
use std::time::Duration;

const ENV_PREFIX: &str = "POSTUREBOT";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Target analysis rate; a best-effort stand-in for the display
    /// refresh rate.
    pub target_fps: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub thresholds: AnalyzerThresholds,
    pub estimator: EstimatorOptions,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            target_fps: 30,
            frame_width: 640,
            frame_height: 480,
            thresholds: AnalyzerThresholds::default(),
            estimator: EstimatorOptions::default(),
        }
    }
}

impl Configuration {
    /// Layered load: defaults, then an optional TOML file, then
    /// POSTUREBOT_* environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = config::File::with_name(path.unwrap_or("posturebot")).required(path.is_some());
        let settings = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        let configuration: Configuration = settings.try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps as f64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::Invalid(
                "target_fps must be greater than 0".to_string(),
            ));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::Invalid(
                "frame dimensions must be greater than 0".to_string(),
            ));
        }

        let t = &self.thresholds;
        if t.max_head_tilt_degrees <= 0.0
            || t.max_gaze_deviation <= 0.0
            || t.max_shoulder_offset <= 0.0
            || t.min_ear_shoulder_gap <= 0.0
        {
            return Err(ConfigError::Invalid(
                "analyzer thresholds must be positive".to_string(),
            ));
        }
        if t.too_far_eye_distance >= t.too_close_eye_distance {
            return Err(ConfigError::Invalid(
                "too_far_eye_distance must be below too_close_eye_distance".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&t.min_visibility) {
            return Err(ConfigError::Invalid(
                "min_visibility must be between 0.0 and 1.0".to_string(),
            ));
        }

        let e = &self.estimator;
        if !(0.0..=1.0).contains(&e.min_detection_confidence)
            || !(0.0..=1.0).contains(&e.min_tracking_confidence)
        {
            return Err(ConfigError::Invalid(
                "estimator confidence thresholds must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        let configuration = Configuration::default();
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.frame_interval(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn zero_fps_is_rejected() {
        let configuration = Configuration {
            target_fps: 0,
            ..Configuration::default()
        };
        assert!(configuration.validate().is_err());
    }

    #[test]
    fn inverted_distance_thresholds_are_rejected() {
        let mut configuration = Configuration::default();
        configuration.thresholds.too_far_eye_distance = 0.5;
        assert!(configuration.validate().is_err());
    }

    #[test]
    fn out_of_range_visibility_is_rejected() {
        let mut configuration = Configuration::default();
        configuration.thresholds.min_visibility = 1.5;
        assert!(configuration.validate().is_err());
    }
}

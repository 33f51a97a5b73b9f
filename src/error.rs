use thiserror::Error;

// Main application error type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Session Error: {0}")]
    Session(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("Estimator is not initialized")]
    NotInitialized,
    #[error("Failed to run inference on frame: {0}")]
    Inference(String),
}

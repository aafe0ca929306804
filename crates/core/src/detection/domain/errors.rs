use std::path::PathBuf;

use thiserror::Error;

/// Why the detection model could not be made ready.
///
/// `Clone` so every caller waiting on the first load observes the same
/// failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelLoadError {
    #[error("model weights not found at {0}")]
    MissingWeights(PathBuf),
    #[error("failed to resolve model weights: {0}")]
    Resolve(String),
    #[error("execution device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("failed to load model: {0}")]
    Backend(String),
}

/// Failure during a forward pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("model not loaded")]
    NotLoaded,
    #[error("inference backend error: {0}")]
    Backend(String),
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
}

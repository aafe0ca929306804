use std::path::PathBuf;

use clap::Parser;

use liveness_core::detection::domain::device::DeviceSelection;
use liveness_core::detection::infrastructure::model_manager::ModelConfig;
use liveness_core::pipeline::predict_faces_use_case::PipelineConfig;
use liveness_core::shared::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_INPUT_SIZE, DEFAULT_MAX_IMAGE_SIZE, DEFAULT_MODEL_PATH,
};

/// Face liveness (real/fake) detection API.
///
/// Every option can also be set through the environment variable shown.
#[derive(Parser, Debug, Clone)]
#[command(name = "liveness-server", version)]
pub struct ServerConfig {
    /// Path to the ONNX detection model.
    #[arg(long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// URL to download the model from when MODEL_PATH does not exist.
    #[arg(long, env = "MODEL_URL")]
    pub model_url: Option<String>,

    /// Minimum confidence for a face to be reported (0.0-1.0).
    #[arg(long, env = "CONFIDENCE_THRESHOLD", default_value_t = DEFAULT_CONFIDENCE)]
    pub confidence: f32,

    /// Execution device: auto, cpu, cuda, cuda:N, coreml, directml.
    #[arg(long, env = "DEVICE", default_value = "auto")]
    pub device: DeviceSelection,

    /// Model input resolution used when the model does not declare one.
    #[arg(long, env = "IMAGE_SIZE", default_value_t = DEFAULT_INPUT_SIZE)]
    pub input_size: u32,

    /// Largest accepted upload in bytes.
    #[arg(long, env = "MAX_IMAGE_SIZE", default_value_t = DEFAULT_MAX_IMAGE_SIZE)]
    pub max_image_size: usize,

    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "API_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Allowed CORS origins (comma-separated, `*` for any).
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            )
            .into());
        }
        if self.input_size == 0 || self.input_size % 32 != 0 {
            return Err(format!(
                "Image size must be a positive multiple of 32, got {}",
                self.input_size
            )
            .into());
        }
        if self.max_image_size == 0 {
            return Err("Max image size must be greater than 0".into());
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(format!("Unknown log level '{}'", self.log_level).into());
        }
        Ok(())
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            weights_path: self.model_path.clone(),
            weights_url: self.model_url.clone(),
            device: self.device,
            input_size: self.input_size,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            confidence: self.confidence,
            max_image_size: self.max_image_size,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

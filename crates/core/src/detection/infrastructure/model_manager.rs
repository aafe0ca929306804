use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::detection::domain::device::{Device, DeviceSelection};
use crate::detection::domain::errors::{InferenceError, ModelLoadError};
use crate::detection::domain::liveness_detector::LivenessDetector;
use crate::detection::domain::raw_detection::RawDetection;
use crate::shared::constants::{DEFAULT_INPUT_SIZE, DEFAULT_MODEL_PATH, UNKNOWN_DEVICE};
use crate::shared::frame::PreprocessedImage;

use super::execution_provider::resolve_device;
use super::model_resolver::resolve_weights;
use super::onnx_liveness_detector::OnnxLivenessDetector;

/// Where the weights live and how to run them.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelConfig {
    pub weights_path: PathBuf,
    /// Download source used when `weights_path` does not exist.
    pub weights_url: Option<String>,
    pub device: DeviceSelection,
    /// Fallback input resolution for models with a dynamic input shape.
    pub input_size: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from(DEFAULT_MODEL_PATH),
            weights_url: None,
            device: DeviceSelection::Auto,
            input_size: DEFAULT_INPUT_SIZE,
        }
    }
}

/// Builds a detector bound to an already-resolved device.
pub trait ModelLoader: Send + Sync {
    fn load(&self, device: Device) -> Result<Arc<dyn LivenessDetector>, ModelLoadError>;
}

/// Loads the ONNX liveness model, fetching the weights first if needed.
pub struct OnnxModelLoader {
    weights_path: PathBuf,
    weights_url: Option<String>,
    input_size: u32,
}

impl OnnxModelLoader {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            weights_path: config.weights_path.clone(),
            weights_url: config.weights_url.clone(),
            input_size: config.input_size,
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self, device: Device) -> Result<Arc<dyn LivenessDetector>, ModelLoadError> {
        let path = resolve_weights(&self.weights_path, self.weights_url.as_deref())?;
        let detector = OnnxLivenessDetector::new(&path, device, self.input_size)?;
        Ok(Arc::new(detector))
    }
}

/// A ready model and the device it runs on.
#[derive(Clone)]
pub struct ModelHandle {
    detector: Arc<dyn LivenessDetector>,
    device: Device,
}

impl ModelHandle {
    pub fn device(&self) -> Device {
        self.device
    }

    pub fn detect(
        &self,
        image: &PreprocessedImage,
        confidence: f32,
    ) -> Result<Vec<RawDetection>, InferenceError> {
        self.detector.detect(image, confidence)
    }
}

/// Owns the one detection model of the process.
///
/// The first `ensure_loaded` call resolves the device and loads the model;
/// callers arriving while that load is in flight block on the same
/// one-time barrier and receive its outcome. The outcome is final: a
/// failed load is never retried and never exposes a partial model. Within
/// that one load, an `auto` accelerator that cannot be bound falls back to
/// the CPU. Inference only reads the settled handle, so requests never contend on
/// the load path.
pub struct ModelManager {
    selection: DeviceSelection,
    resolve: fn(DeviceSelection) -> Device,
    loader: Box<dyn ModelLoader>,
    state: OnceLock<Result<ModelHandle, ModelLoadError>>,
}

impl ModelManager {
    pub fn new(selection: DeviceSelection, loader: Box<dyn ModelLoader>) -> Self {
        Self {
            selection,
            resolve: resolve_device,
            loader,
            state: OnceLock::new(),
        }
    }

    /// Manager for the ONNX model described by `config`. Nothing is loaded yet.
    pub fn onnx(config: &ModelConfig) -> Self {
        Self::new(config.device, Box::new(OnnxModelLoader::new(config)))
    }

    /// Load the model once; every later call returns the same outcome.
    pub fn ensure_loaded(&self) -> Result<&ModelHandle, ModelLoadError> {
        self.state
            .get_or_init(|| self.load())
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Readiness, without triggering a load.
    pub fn is_loaded(&self) -> bool {
        self.handle().is_some()
    }

    /// Resolved device id, or `"unknown"` when no model is loaded.
    pub fn current_device(&self) -> String {
        self.handle()
            .map(|h| h.device().to_string())
            .unwrap_or_else(|| UNKNOWN_DEVICE.to_string())
    }

    /// The loaded model, if any.
    pub fn handle(&self) -> Option<&ModelHandle> {
        self.state.get().and_then(|state| state.as_ref().ok())
    }

    /// Run the loaded model on `image` with the given confidence cutoff.
    pub fn invoke(
        &self,
        image: &PreprocessedImage,
        confidence: f32,
    ) -> Result<Vec<RawDetection>, InferenceError> {
        let handle = self.handle().ok_or(InferenceError::NotLoaded)?;
        handle.detect(image, confidence)
    }

    fn load(&self) -> Result<ModelHandle, ModelLoadError> {
        let started = Instant::now();
        let device = (self.resolve)(self.selection);
        log::info!("Loading detection model (requested {}, using {device})", self.selection);

        let (detector, device) = match self.loader.load(device) {
            Ok(detector) => (detector, device),
            // Auto retries on the CPU when the detected accelerator cannot be bound.
            Err(ModelLoadError::DeviceUnavailable(reason))
                if self.selection == DeviceSelection::Auto && device != Device::Cpu =>
            {
                log::warn!("{device} unavailable ({reason}), falling back to CPU");
                match self.loader.load(Device::Cpu) {
                    Ok(detector) => (detector, Device::Cpu),
                    Err(e) => return Err(load_failed(e)),
                }
            }
            Err(e) => return Err(load_failed(e)),
        };

        log::info!(
            "Model ready on {device} in {:.0} ms",
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(ModelHandle { detector, device })
    }

}

fn load_failed(e: ModelLoadError) -> ModelLoadError {
    log::error!("Model load failed: {e}");
    e
}

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::errors::InferenceError;
use crate::detection::domain::result_formatter::{Detection, ResultFormatter};
use crate::detection::infrastructure::model_manager::ModelManager;
use crate::imaging::domain::image_decoder::{DecodeError, ImageDecoder};
use crate::imaging::domain::preprocessor::preprocess;
use crate::pipeline::upload_validator::{validate_upload, ValidationError};
use crate::shared::constants::{DEFAULT_CONFIDENCE, DEFAULT_MAX_IMAGE_SIZE};

/// Per-process pipeline policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Model cutoff and default reporting threshold.
    pub confidence: f32,
    /// Largest accepted upload, in bytes.
    pub max_image_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
        }
    }
}

/// An uploaded file as received.
#[derive(Clone, Copy, Debug)]
pub struct Upload<'a> {
    pub bytes: &'a [u8],
    pub content_type: Option<&'a str>,
}

/// Faces found in one image, in model emission order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub faces: Vec<Detection>,
    pub latency_ms: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PipelineError {
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation_error",
            PipelineError::Decode(_) => "decode_error",
            PipelineError::Inference(_) => "inference_error",
        }
    }

    /// Whether the caller can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Validation(_) | PipelineError::Decode(_)
        )
    }
}

/// Single-image pipeline: validate → decode → preprocess → infer → format.
///
/// Only the inference step touches the shared model; everything before it
/// is request-local, so a bad upload never affects the model state.
pub struct PredictFacesUseCase {
    decoder: Box<dyn ImageDecoder>,
    model: Arc<ModelManager>,
    formatter: ResultFormatter,
    config: PipelineConfig,
}

impl PredictFacesUseCase {
    pub fn new(
        decoder: Box<dyn ImageDecoder>,
        model: Arc<ModelManager>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            decoder,
            model,
            formatter: ResultFormatter::new(config.confidence),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model(&self) -> &ModelManager {
        &self.model
    }

    /// Runs the pipeline; `threshold` overrides the configured reporting
    /// threshold for this call.
    pub fn execute(
        &self,
        upload: Upload<'_>,
        threshold: Option<f32>,
    ) -> Result<PredictionResult, PipelineError> {
        self.execute_since(upload, threshold, Instant::now())
    }

    /// Like [`execute`](Self::execute), with `latency_ms` measured from
    /// `received` (when the request arrived, before its body was read).
    pub fn execute_since(
        &self,
        upload: Upload<'_>,
        threshold: Option<f32>,
        received: Instant,
    ) -> Result<PredictionResult, PipelineError> {
        let started = Instant::now();

        validate_upload(
            upload.content_type,
            upload.bytes.len(),
            self.config.max_image_size,
        )?;

        let decoded = self.decoder.decode(upload.bytes)?;
        let decode_ms = elapsed_ms(started);
        let image = preprocess(&decoded);
        drop(decoded);

        let raw = self.model.invoke(&image, self.config.confidence)?;
        let infer_ms = elapsed_ms(started) - decode_ms;
        let faces = self.formatter.format(&raw, threshold);

        let latency_ms = elapsed_ms(received);
        log::debug!(
            "Stage timings: decode {decode_ms:.1} ms, inference {infer_ms:.1} ms, request {latency_ms:.1} ms"
        );
        log::info!(
            "Detections: {} raw, {} reported ({}x{} image)",
            raw.len(),
            faces.len(),
            image.width(),
            image.height()
        );

        Ok(PredictionResult { faces, latency_ms })
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::device::{Device, DeviceSelection};
    use crate::detection::domain::errors::ModelLoadError;
    use crate::detection::domain::label::Label;
    use crate::detection::domain::liveness_detector::LivenessDetector;
    use crate::detection::domain::raw_detection::RawDetection;
    use crate::detection::infrastructure::model_manager::ModelLoader;
    use crate::imaging::infrastructure::image_crate_decoder::ImageCrateDecoder;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::{DecodedImage, PreprocessedImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // --- Stubs ---

    struct StubDetector {
        detections: Vec<RawDetection>,
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<(u32, u32, [u8; 3], f32)>>>,
        fail: bool,
    }

    impl LivenessDetector for StubDetector {
        fn detect(
            &self,
            image: &PreprocessedImage,
            confidence: f32,
        ) -> Result<Vec<RawDetection>, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push((
                image.width(),
                image.height(),
                image.pixel(0, 0),
                confidence,
            ));
            if self.fail {
                return Err(InferenceError::Backend("out of memory".into()));
            }
            Ok(self
                .detections
                .iter()
                .filter(|d| d.confidence >= confidence)
                .copied()
                .collect())
        }
    }

    struct StubLoader {
        detections: Vec<RawDetection>,
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<(u32, u32, [u8; 3], f32)>>>,
        fail: bool,
    }

    impl ModelLoader for StubLoader {
        fn load(&self, _device: Device) -> Result<Arc<dyn LivenessDetector>, ModelLoadError> {
            Ok(Arc::new(StubDetector {
                detections: self.detections.clone(),
                calls: self.calls.clone(),
                seen: self.seen.clone(),
                fail: self.fail,
            }))
        }
    }

    struct CountingDecoder {
        calls: Arc<AtomicUsize>,
    }

    impl ImageDecoder for CountingDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ImageCrateDecoder::new().decode(bytes)
        }
    }

    struct Harness {
        use_case: PredictFacesUseCase,
        detect_calls: Arc<AtomicUsize>,
        decode_calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<(u32, u32, [u8; 3], f32)>>>,
    }

    fn harness(detections: Vec<RawDetection>, fail: bool, load: bool) -> Harness {
        let detect_calls = Arc::new(AtomicUsize::new(0));
        let decode_calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let loader = StubLoader {
            detections,
            calls: detect_calls.clone(),
            seen: seen.clone(),
            fail,
        };
        let model = Arc::new(ModelManager::new(
            DeviceSelection::Explicit(Device::Cpu),
            Box::new(loader),
        ));
        if load {
            model.ensure_loaded().unwrap();
        }
        let decoder = CountingDecoder {
            calls: decode_calls.clone(),
        };
        let config = PipelineConfig {
            confidence: 0.7,
            max_image_size: 64 * 1024,
        };
        Harness {
            use_case: PredictFacesUseCase::new(Box::new(decoder), model, config),
            detect_calls,
            decode_calls,
            seen,
        }
    }

    fn raw(class_id: u32, confidence: f32, corners: [f32; 4]) -> RawDetection {
        RawDetection {
            class_id,
            confidence,
            x1: corners[0],
            y1: corners[1],
            x2: corners[2],
            y2: corners[3],
        }
    }

    fn png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn upload<'a>(bytes: &'a [u8], content_type: &'a str) -> Upload<'a> {
        Upload {
            bytes,
            content_type: Some(content_type),
        }
    }

    // --- Tests ---

    #[test]
    fn test_formats_model_output() {
        let h = harness(
            vec![
                raw(1, 0.9, [10.0, 20.0, 100.0, 150.0]),
                raw(0, 0.75, [1.5, 2.5, 30.9, 40.1]),
            ],
            false,
            true,
        );
        let bytes = png(640, 480, [255, 0, 0]);

        let result = h.use_case.execute(upload(&bytes, "image/png"), None).unwrap();

        assert_eq!(result.faces.len(), 2);
        assert_eq!(result.faces[0].label, Label::Fake);
        assert_eq!(
            result.faces[0].bbox,
            BoundingBox {
                x: 10,
                y: 20,
                w: 90,
                h: 130
            }
        );
        assert_eq!(result.faces[1].label, Label::Real);
        assert_eq!(
            result.faces[1].bbox,
            BoundingBox {
                x: 1,
                y: 2,
                w: 29,
                h: 38
            }
        );
        assert!(result.latency_ms >= 0.0);
    }

    #[test]
    fn test_detector_sees_rgb_at_source_resolution_and_configured_cutoff() {
        let h = harness(Vec::new(), false, true);
        let bytes = png(64, 48, [255, 0, 0]);

        h.use_case.execute(upload(&bytes, "image/png"), Some(0.9)).unwrap();

        let seen = h.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (w, ht, px, cutoff) = seen[0];
        assert_eq!((w, ht), (64, 48));
        assert_eq!(px, [255, 0, 0]);
        assert_eq!(cutoff, 0.7);
    }

    #[test]
    fn test_caller_threshold_overrides_default() {
        let h = harness(
            vec![
                raw(1, 0.95, [0.0, 0.0, 10.0, 10.0]),
                raw(0, 0.8, [20.0, 0.0, 30.0, 10.0]),
            ],
            false,
            true,
        );
        let bytes = png(32, 32, [0, 0, 0]);

        let result = h
            .use_case
            .execute(upload(&bytes, "image/png"), Some(0.9))
            .unwrap();
        assert_eq!(result.faces.len(), 1);
        assert_eq!(result.faces[0].label, Label::Fake);
    }

    #[test]
    fn test_latency_counts_from_request_arrival() {
        let h = harness(Vec::new(), false, true);
        let bytes = png(8, 8, [0, 0, 0]);
        let received = Instant::now() - std::time::Duration::from_millis(200);

        let result = h
            .use_case
            .execute_since(upload(&bytes, "image/png"), None, received)
            .unwrap();
        assert!(result.latency_ms >= 200.0);
    }

    #[test]
    fn test_solid_image_without_faces_is_success() {
        let h = harness(Vec::new(), false, true);
        let bytes = png(640, 640, [128, 128, 128]);

        let result = h.use_case.execute(upload(&bytes, "image/png"), None).unwrap();
        assert!(result.faces.is_empty());
    }

    #[test]
    fn test_text_upload_rejected_before_any_work() {
        let h = harness(Vec::new(), false, true);

        let err = h
            .use_case
            .execute(upload(b"not an image", "text/plain"), None)
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::UnsupportedMediaType(_))
        ));
        assert!(err.is_client_error());
        assert_eq!(h.decode_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.detect_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_oversized_upload_rejected_without_decode() {
        let h = harness(Vec::new(), false, true);
        let bytes = vec![0u8; 64 * 1024 + 1];

        let err = h
            .use_case
            .execute(upload(&bytes, "image/jpeg"), None)
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::PayloadTooLarge { .. })
        ));
        assert_eq!(h.decode_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.detect_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_corrupt_image_is_client_error_and_model_untouched() {
        let h = harness(Vec::new(), false, true);

        let err = h
            .use_case
            .execute(upload(b"\x89PNG garbage", "image/png"), None)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Decode(_)));
        assert_eq!(err.category(), "decode_error");
        assert!(err.is_client_error());
        assert_eq!(h.detect_calls.load(Ordering::SeqCst), 0);
        assert!(h.use_case.model().is_loaded());
    }

    #[test]
    fn test_unloaded_model_is_server_error() {
        let h = harness(Vec::new(), false, false);
        let bytes = png(8, 8, [0, 0, 0]);

        let err = h
            .use_case
            .execute(upload(&bytes, "image/png"), None)
            .unwrap_err();

        assert_eq!(err, PipelineError::Inference(InferenceError::NotLoaded));
        assert_eq!(err.category(), "inference_error");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_backend_failure_is_server_error() {
        let h = harness(Vec::new(), true, true);
        let bytes = png(8, 8, [0, 0, 0]);

        let err = h
            .use_case
            .execute(upload(&bytes, "image/png"), None)
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Inference(InferenceError::Backend(_))
        ));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_result_wire_format() {
        let result = PredictionResult {
            faces: vec![Detection {
                label: Label::Real,
                confidence: 0.5,
                bbox: BoundingBox {
                    x: 0,
                    y: 0,
                    w: 2,
                    h: 2,
                },
            }],
            latency_ms: 12.5,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["latency_ms"], 12.5);
        assert_eq!(json["faces"][0]["label"], "real");
        assert_eq!(json["faces"][0]["bbox"]["w"], 2);
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.confidence, 0.70);
        assert_eq!(config.max_image_size, 10 * 1024 * 1024);
    }
}

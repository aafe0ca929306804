/// Real/fake face detector running a YOLO ONNX export through `ort`.
///
/// Handles letterbox resizing to the model's input resolution, inference,
/// class selection, confidence cutoff and per-class NMS.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::device::Device;
use crate::detection::domain::errors::{InferenceError, ModelLoadError};
use crate::detection::domain::liveness_detector::LivenessDetector;
use crate::detection::domain::raw_detection::RawDetection;
use crate::shared::frame::PreprocessedImage;

use super::execution_provider::execution_providers;
use super::math::{clip_box, nms};

/// NMS IoU threshold.
const NMS_IOU_THRESH: f32 = 0.7;

/// Upper bound on boxes returned per image.
const MAX_DETECTIONS: usize = 300;

/// Box coordinates preceding the class scores in each output row.
const BOX_VALUES: usize = 4;

/// Letterbox fill value (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Liveness detector backed by an ONNX Runtime session.
pub struct OnnxLivenessDetector {
    session: Mutex<ort::session::Session>,
    input_size: InputSize,
}

/// Model input resolution in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

impl InputSize {
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
        }
    }
}

impl OnnxLivenessDetector {
    /// Load a YOLO ONNX model bound to `device`.
    ///
    /// The input resolution is read from the model's input shape (expecting
    /// NCHW). Each dynamic axis falls back to `default_input_size`.
    pub fn new(
        model_path: &Path,
        device: Device,
        default_input_size: u32,
    ) -> Result<Self, ModelLoadError> {
        if !model_path.exists() {
            return Err(ModelLoadError::MissingWeights(model_path.to_path_buf()));
        }

        let providers = execution_providers(device)?;
        let session = ort::session::Session::builder()
            .map_err(|e| ModelLoadError::Backend(e.to_string()))?
            .with_execution_providers(providers)
            .map_err(|e| ModelLoadError::DeviceUnavailable(format!("{device}: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| ModelLoadError::Backend(e.to_string()))?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    Some(input_dims(&shape[..], default_input_size))
                } else {
                    None
                }
            })
            .unwrap_or(InputSize::square(default_input_size));

        log::info!(
            "Loaded {} on {device} (input {}x{})",
            model_path.display(),
            input_size.width,
            input_size.height
        );

        Ok(Self {
            session: Mutex::new(session),
            input_size,
        })
    }

    pub fn input_size(&self) -> InputSize {
        self.input_size
    }
}

impl LivenessDetector for OnnxLivenessDetector {
    fn detect(
        &self,
        image: &PreprocessedImage,
        confidence: f32,
    ) -> Result<Vec<RawDetection>, InferenceError> {
        let Letterbox { tensor, transform } = letterbox(image, self.input_size);

        let input_value = ort::value::Tensor::from_array(tensor)
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        // Only the forward pass holds the session.
        let (shape, data) = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| InferenceError::Backend("session lock poisoned".into()))?;
            let outputs = session
                .run(ort::inputs![input_value])
                .map_err(|e| InferenceError::Backend(e.to_string()))?;
            if outputs.len() == 0 {
                return Err(InferenceError::UnexpectedOutput(
                    "model produced no outputs".into(),
                ));
            }
            let tensor = outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| InferenceError::UnexpectedOutput(e.to_string()))?;
            (tensor.shape().to_vec(), tensor.iter().copied().collect::<Vec<f32>>())
        };

        let candidates = decode_output(&shape, &data, confidence)?;
        let detections = candidates
            .into_iter()
            .map(|det| transform.to_source(det, image.width(), image.height()))
            .collect();
        Ok(nms(detections, NMS_IOU_THRESH, MAX_DETECTIONS))
    }
}

/// Width and height from an NCHW input shape; dynamic axes (`-1`, `0`)
/// fall back to `default`.
fn input_dims(shape: &[i64], default: u32) -> InputSize {
    let axis = |i: usize| {
        shape
            .get(i)
            .filter(|&&d| d > 0)
            .map_or(default, |&d| d as u32)
    };
    if shape.len() != 4 {
        return InputSize::square(default);
    }
    InputSize {
        width: axis(3),
        height: axis(2),
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// NCHW model input plus the transform back to source pixels.
struct Letterbox {
    tensor: ndarray::Array4<f32>,
    transform: LetterboxTransform,
}

#[derive(Clone, Copy, Debug)]
struct LetterboxTransform {
    scale: f32,
    pad_x: u32,
    pad_y: u32,
}

impl LetterboxTransform {
    /// Map a box from letterbox space to the source image, clipped to it.
    fn to_source(&self, det: RawDetection, width: u32, height: u32) -> RawDetection {
        let px = self.pad_x as f32;
        let py = self.pad_y as f32;
        let [x1, y1, x2, y2] = clip_box(
            [
                (det.x1 - px) / self.scale,
                (det.y1 - py) / self.scale,
                (det.x2 - px) / self.scale,
                (det.y2 - py) / self.scale,
            ],
            width,
            height,
        );
        RawDetection {
            x1,
            y1,
            x2,
            y2,
            ..det
        }
    }
}

/// Letterbox-resize an RGB image to the model input, normalized to [0, 1].
fn letterbox(image: &PreprocessedImage, target: InputSize) -> Letterbox {
    let fw = image.width() as f32;
    let fh = image.height() as f32;

    let scale = (target.width as f32 / fw).min(target.height as f32 / fh);
    let new_w = ((fw * scale).round() as u32).clamp(1, target.width);
    let new_h = ((fh * scale).round() as u32).clamp(1, target.height);
    let pad_x = (target.width - new_w) / 2;
    let pad_y = (target.height - new_h) / 2;

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target.height as usize, target.width as usize),
        PAD_VALUE,
    );

    let src = image.as_ndarray(); // [H, W, C] u8
    let src_h = image.height() as usize;
    let src_w = image.width() as usize;

    // Nearest-neighbor resize + copy into padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f32 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f32 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Letterbox {
        tensor,
        transform: LetterboxTransform {
            scale,
            pad_x,
            pad_y,
        },
    }
}

// ---------------------------------------------------------------------------
// Output decoding
// ---------------------------------------------------------------------------

/// Parse a YOLO detection head output into candidate boxes (letterbox space).
///
/// Rows are `[cx, cy, w, h, class_0, …, class_{C-1}]`. Exports lay them out
/// either `[1, 4 + C, N]` or `[1, N, 4 + C]`; anchors always outnumber
/// features, which tells the two apart.
fn decode_output(
    shape: &[usize],
    data: &[f32],
    confidence: f32,
) -> Result<Vec<RawDetection>, InferenceError> {
    if shape.len() != 3 || shape[0] != 1 {
        return Err(InferenceError::UnexpectedOutput(format!(
            "expected [1, features, anchors], got {shape:?}"
        )));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats <= BOX_VALUES {
        return Err(InferenceError::UnexpectedOutput(format!(
            "output rows have no class scores: {shape:?}"
        )));
    }
    if data.len() != num_dets * num_feats {
        return Err(InferenceError::UnexpectedOutput(format!(
            "output holds {} values, shape {shape:?} needs {}",
            data.len(),
            num_dets * num_feats
        )));
    }

    let value = |det: usize, feat: usize| {
        if transposed {
            data[feat * num_dets + det]
        } else {
            data[det * num_feats + feat]
        }
    };

    let mut candidates = Vec::new();
    for i in 0..num_dets {
        let (class_id, score) = (BOX_VALUES..num_feats)
            .map(|f| ((f - BOX_VALUES) as u32, value(i, f)))
            .fold((0u32, f32::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            });
        if score < confidence {
            continue;
        }

        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        candidates.push(RawDetection {
            class_id,
            confidence: score,
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        });
    }
    Ok(candidates)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

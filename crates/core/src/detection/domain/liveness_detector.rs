use crate::detection::domain::errors::InferenceError;
use crate::detection::domain::raw_detection::RawDetection;
use crate::shared::frame::PreprocessedImage;

/// Domain interface for the face liveness model.
///
/// Implementations are shared by every in-flight request, hence `&self`
/// and `Sync`. Boxes scoring below `confidence` are discarded by the
/// model itself; survivors come back in emission order with corners in
/// the pixel space of `image`.
pub trait LivenessDetector: Send + Sync {
    fn detect(
        &self,
        image: &PreprocessedImage,
        confidence: f32,
    ) -> Result<Vec<RawDetection>, InferenceError>;
}

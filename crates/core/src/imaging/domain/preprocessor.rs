use crate::shared::frame::{DecodedImage, PreprocessedImage, CHANNELS};

/// Reorders a decoded BGR image into the RGB layout the detector consumes.
///
/// No resizing or cropping happens here; letterboxing to the model's input
/// resolution belongs to the detector. Pure: equal inputs give equal outputs.
pub fn preprocess(image: &DecodedImage) -> PreprocessedImage {
    let mut data = image.data().to_vec();
    for px in data.chunks_exact_mut(CHANNELS) {
        px.swap(0, 2);
    }
    PreprocessedImage::new(data, image.width(), image.height())
}

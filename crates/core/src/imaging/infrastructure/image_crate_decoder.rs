use crate::imaging::domain::image_decoder::{DecodeError, ImageDecoder};
use crate::shared::frame::{DecodedImage, CHANNELS};

/// Decodes common image containers (JPEG, PNG, BMP, WebP) with the `image`
/// crate.
///
/// The container is sniffed from the bytes, never from a file name or media
/// type. Any color type is flattened to 8-bit, 3-channel BGR; alpha is
/// dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let decoded =
            image::load_from_memory(bytes).map_err(|e| DecodeError::Unparseable(e.to_string()))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::Unparseable(format!(
                "image has zero-sized dimensions {width}x{height}"
            )));
        }

        let mut pixels = rgb.into_raw();
        for px in pixels.chunks_exact_mut(CHANNELS) {
            px.swap(0, 2);
        }
        Ok(DecodedImage::new(pixels, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::domain::preprocessor::preprocess;
    use std::io::Cursor;

    fn encode(width: u32, height: u32, rgb: [u8; 3], format: image::ImageFormat) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn test_png_red_pixel_decodes_as_bgr() {
        let bytes = encode(4, 3, [255, 0, 0], image::ImageFormat::Png);
        let decoded = ImageCrateDecoder::new().decode(&bytes).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
        assert_eq!(decoded.pixel(0, 0), [0, 0, 255]);
    }

    #[test]
    fn test_png_round_trip_through_preprocessor() {
        let bytes = encode(2, 2, [50, 100, 200], image::ImageFormat::Png);
        let decoded = ImageCrateDecoder::new().decode(&bytes).unwrap();
        let rgb = preprocess(&decoded);
        assert_eq!(rgb.pixel(1, 1), [50, 100, 200]);
    }

    #[test]
    fn test_jpeg_decodes() {
        let bytes = encode(64, 48, [255, 0, 0], image::ImageFormat::Jpeg);
        let decoded = ImageCrateDecoder::new().decode(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));

        // Lossy: red dominates in the last (R) slot of BGR.
        let [b, g, r] = decoded.pixel(10, 10);
        assert!(r > 200, "r = {r}");
        assert!(g < 40 && b < 40, "g = {g}, b = {b}");
    }

    #[test]
    fn test_rgba_drops_alpha() {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 0]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        let decoded = ImageCrateDecoder::new().decode(&buf).unwrap();
        assert_eq!(decoded.data().len(), 2 * 2 * 3);
        assert_eq!(decoded.pixel(0, 0), [30, 20, 10]);
    }

    #[test]
    fn test_empty_buffer_is_error() {
        assert_eq!(
            ImageCrateDecoder::new().decode(&[]),
            Err(DecodeError::Empty)
        );
    }

    #[test]
    fn test_garbage_is_unparseable() {
        let result = ImageCrateDecoder::new().decode(b"not an image");
        assert!(matches!(result, Err(DecodeError::Unparseable(_))));
    }

    #[test]
    fn test_truncated_png_is_unparseable() {
        let bytes = encode(16, 16, [1, 2, 3], image::ImageFormat::Png);
        let result = ImageCrateDecoder::new().decode(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(DecodeError::Unparseable(_))));
    }
}

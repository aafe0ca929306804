use thiserror::Error;

use crate::shared::constants::IMAGE_MEDIA_PREFIX;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("File must be an image (JPEG/PNG), got content type '{0}'")]
    UnsupportedMediaType(String),
    #[error("Image too large: {size} bytes. Max size: {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("No image file in request")]
    MissingFile,
}

/// Cheap checks run before any decoding or model work.
///
/// The content type must start with `image/` (case-insensitive, parameters
/// allowed); a missing content type is rejected the same way.
pub fn validate_upload(
    content_type: Option<&str>,
    size: usize,
    max_size: usize,
) -> Result<(), ValidationError> {
    let content_type = content_type.unwrap_or_default().trim();
    let is_image = content_type
        .get(..IMAGE_MEDIA_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(IMAGE_MEDIA_PREFIX));
    if !is_image {
        return Err(ValidationError::UnsupportedMediaType(content_type.to_string()));
    }
    if size > max_size {
        return Err(ValidationError::PayloadTooLarge {
            size,
            limit: max_size,
        });
    }
    Ok(())
}

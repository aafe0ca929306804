use thiserror::Error;

use crate::shared::frame::DecodedImage;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("image data is empty")]
    Empty,
    #[error("failed to decode image: {0}")]
    Unparseable(String),
}

/// Domain interface for turning encoded upload bytes into pixels.
///
/// Implementations must not keep the decoded image after returning it.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError>;
}

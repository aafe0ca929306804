pub mod image_decoder;
pub mod preprocessor;

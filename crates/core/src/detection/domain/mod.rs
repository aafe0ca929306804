pub mod device;
pub mod errors;
pub mod label;
pub mod liveness_detector;
pub mod raw_detection;
pub mod result_formatter;

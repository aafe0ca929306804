//! Face liveness detection: decode an uploaded image, run the anti-spoofing
//! model once per request and report each face as real or fake.

pub mod detection;
pub mod imaging;
pub mod pipeline;
pub mod shared;

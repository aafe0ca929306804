pub const APP_NAME: &str = "Anti-Spoofing Detection API";

pub const DEFAULT_MODEL_PATH: &str = "model/anti_spoofing.onnx";

/// Minimum score a face must reach to be reported.
pub const DEFAULT_CONFIDENCE: f32 = 0.70;

/// Square resolution the detector was trained at.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// 10 MiB.
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Media type prefix every upload must carry.
pub const IMAGE_MEDIA_PREFIX: &str = "image/";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Device sentinel reported while no model is loaded.
pub const UNKNOWN_DEVICE: &str = "unknown";

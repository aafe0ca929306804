use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use liveness_core::detection::domain::device::DeviceSelection;
use liveness_core::detection::infrastructure::model_manager::{ModelConfig, ModelManager};
use liveness_core::imaging::infrastructure::image_crate_decoder::ImageCrateDecoder;
use liveness_core::pipeline::predict_faces_use_case::{
    PipelineConfig, PredictFacesUseCase, Upload,
};
use liveness_core::shared::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_INPUT_SIZE, DEFAULT_MAX_IMAGE_SIZE, DEFAULT_MODEL_PATH,
    IMAGE_EXTENSIONS,
};

/// Classify faces in an image as real or fake.
#[derive(Parser)]
#[command(name = "liveness", version)]
struct Cli {
    /// Input image file.
    input: PathBuf,

    /// Face confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f32,

    /// Path to the ONNX detection model.
    #[arg(long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// URL to download the model from when it is missing locally.
    #[arg(long, env = "MODEL_URL")]
    model_url: Option<String>,

    /// Execution device: auto, cpu, cuda, cuda:N, coreml, directml.
    #[arg(long, env = "DEVICE", default_value = "auto")]
    device: DeviceSelection,

    /// Model input resolution used when the model does not declare one.
    #[arg(long, default_value_t = DEFAULT_INPUT_SIZE)]
    image_size: u32,

    /// Largest accepted image in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_IMAGE_SIZE)]
    max_image_size: usize,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let model = Arc::new(ModelManager::onnx(&ModelConfig {
        weights_path: cli.model.clone(),
        weights_url: cli.model_url.clone(),
        device: cli.device,
        input_size: cli.image_size,
    }));
    model.ensure_loaded()?;

    let use_case = PredictFacesUseCase::new(
        Box::new(ImageCrateDecoder::new()),
        model,
        PipelineConfig {
            confidence: cli.confidence,
            max_image_size: cli.max_image_size,
        },
    );

    let bytes = std::fs::read(&cli.input)?;
    let content_type = content_type_for(&cli.input);
    let result = use_case.execute(
        Upload {
            bytes: &bytes,
            content_type: content_type.as_deref(),
        },
        None,
    )?;

    log::info!(
        "{}: {} face(s) in {:.1} ms",
        cli.input.display(),
        result.faces.len(),
        result.latency_ms
    );
    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.image_size == 0 || cli.image_size % 32 != 0 {
        return Err(format!(
            "Image size must be a positive multiple of 32, got {}",
            cli.image_size
        )
        .into());
    }
    Ok(())
}

/// Media type implied by the file extension, `None` for non-image files.
fn content_type_for(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    let subtype = if ext == "jpg" { "jpeg" } else { ext.as_str() };
    Some(format!("image/{subtype}"))
}

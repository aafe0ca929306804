//! Face liveness detection HTTP server.
//!
//! Loads the anti-spoofing model once at startup and serves `/v1/predict`
//! and `/v1/health`. The process exits with status 1 if configuration is
//! invalid or the model cannot be loaded.

mod config;
mod error;
mod routes;
mod state;

use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use liveness_core::detection::infrastructure::model_manager::ModelManager;
use liveness_core::imaging::infrastructure::image_crate_decoder::ImageCrateDecoder;
use liveness_core::pipeline::predict_faces_use_case::PredictFacesUseCase;

use crate::config::ServerConfig;
use crate::state::AppState;

fn main() {
    let config = ServerConfig::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    if let Err(e) = run(config) {
        log::error!("{e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve(config))
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Liveness server v{}", env!("CARGO_PKG_VERSION"));
    log::info!(
        "Model {} | device {} | confidence {:.2} | max upload {} bytes",
        config.model_path.display(),
        config.device,
        config.confidence,
        config.max_image_size
    );

    let model = Arc::new(ModelManager::onnx(&config.model_config()));
    let loading = Arc::clone(&model);
    tokio::task::spawn_blocking(move || loading.ensure_loaded().map(|_| ())).await??;

    let use_case = PredictFacesUseCase::new(
        Box::new(ImageCrateDecoder::new()),
        model,
        config.pipeline_config(),
    );
    let state = Arc::new(AppState::new(use_case));
    let app = routes::router(state, &config.cors_origins);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    log::info!("Listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested, draining connections");
}

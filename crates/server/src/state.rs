use std::sync::Arc;
use std::time::Instant;

use liveness_core::detection::infrastructure::model_manager::ModelManager;
use liveness_core::pipeline::predict_faces_use_case::PredictFacesUseCase;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub use_case: PredictFacesUseCase,
    pub started_at: Instant,
    pub version: &'static str,
}

impl AppState {
    pub fn new(use_case: PredictFacesUseCase) -> Self {
        Self {
            use_case,
            started_at: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn model(&self) -> &ModelManager {
        self.use_case.model()
    }
}

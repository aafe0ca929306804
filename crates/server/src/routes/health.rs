use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub device: String,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<f64>,
}

/// Always answers 200; a missing model shows up as `degraded`.
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    let model = state.model();
    let model_loaded = model.is_loaded();
    Json(HealthResponse {
        status: if model_loaded { "healthy" } else { "degraded" },
        model_loaded,
        device: model.current_device(),
        version: state.version,
        uptime_seconds: Some(state.started_at.elapsed().as_secs_f64()),
    })
}

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use liveness_core::shared::constants::APP_NAME;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub docs: &'static str,
}

pub async fn root(State(state): State<SharedState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: APP_NAME,
        version: state.version,
        docs: "/v1/health",
    })
}

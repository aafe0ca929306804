use std::time::Instant;

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::Deserialize;

use liveness_core::pipeline::predict_faces_use_case::{PipelineError, PredictionResult, Upload};
use liveness_core::pipeline::upload_validator::ValidationError;

use crate::error::ApiError;
use crate::state::SharedState;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

#[derive(Deserialize, Debug, Default)]
pub struct PredictParams {
    pub confidence: Option<f32>,
}

struct FilePart {
    bytes: Bytes,
    content_type: Option<String>,
}

pub async fn predict(
    State(state): State<SharedState>,
    query: Result<Query<PredictParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let received = Instant::now();
    let Query(params) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if let Some(c) = params.confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(ApiError::BadRequest(format!(
                "confidence must be between 0.0 and 1.0, got {c}"
            )));
        }
    }

    let file = read_file_part(&mut multipart).await?;
    log::debug!(
        "Received upload: {} bytes, content type {:?}",
        file.bytes.len(),
        file.content_type
    );

    // Decoding and inference are CPU-bound.
    let result = tokio::task::spawn_blocking(move || {
        let upload = Upload {
            bytes: &file.bytes,
            content_type: file.content_type.as_deref(),
        };
        state
            .use_case
            .execute_since(upload, params.confidence, received)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("prediction task failed: {e}")))??;

    Ok(Json(result))
}

async fn read_file_part(multipart: &mut Multipart) -> Result<FilePart, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(FilePart {
            bytes,
            content_type,
        });
    }
    Err(PipelineError::from(ValidationError::MissingFile).into())
}

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use liveness_core::pipeline::predict_faces_use_case::PipelineError;

/// JSON body of every non-2xx response.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    Pipeline(PipelineError),
    BadRequest(String),
    Multipart(MultipartError),
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Pipeline(e)
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Multipart(e)
    }
}

impl ApiError {
    fn client(status: StatusCode, error: &str, detail: String) -> Response {
        let body = ErrorBody {
            error: error.to_string(),
            detail,
            correlation_id: None,
        };
        (status, Json(body)).into_response()
    }

    /// Server faults are logged in full; the client only sees an id to quote.
    fn server(error: &str, cause: &str) -> Response {
        let id = Uuid::new_v4().to_string();
        log::error!("[{id}] {error}: {cause}");
        let body = ErrorBody {
            error: error.to_string(),
            detail: "Internal server error".to_string(),
            correlation_id: Some(id),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Pipeline(e) if e.is_client_error() => {
                log::info!("Rejected request: {e}");
                Self::client(StatusCode::BAD_REQUEST, e.category(), e.to_string())
            }
            ApiError::Pipeline(e) => Self::server(e.category(), &e.to_string()),
            ApiError::BadRequest(detail) => {
                Self::client(StatusCode::BAD_REQUEST, "validation_error", detail)
            }
            ApiError::Multipart(e) => {
                let status = e.status();
                if status.is_server_error() {
                    Self::server("multipart_error", &e.body_text())
                } else {
                    Self::client(status, "validation_error", e.body_text())
                }
            }
            ApiError::Internal(cause) => Self::server("internal_error", &cause),
        }
    }
}

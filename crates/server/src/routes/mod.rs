pub mod health;
pub mod predict;
pub mod root;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::state::SharedState;

/// Room for multipart boundaries and part headers on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: SharedState, cors_origins: &[String]) -> Router {
    let body_limit = state.use_case.config().max_image_size + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(root::root))
        .route("/v1/health", get(health::health_check))
        .route("/v1/predict", post(predict::predict))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        return layer.allow_origin(Any);
    }
    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin '{o}'");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(values))
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = router(test_support::state(vec![], true), &["*".to_string()]);
        let response = app
            .oneshot(Request::get("/v2/nothing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let app = router(
            test_support::state(vec![], true),
            &["http://app.example".to_string()],
        );
        let request = Request::get("/v1/health")
            .header(header::ORIGIN, "http://app.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://app.example"
        );
    }
}

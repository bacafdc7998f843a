use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use crate::handlers::{generate_handler, health_handler, method_not_allowed, metrics_handler};
use crate::state::AppState;

pub fn router(state: Arc<AppState>, cors: bool) -> Router {
    // OPTIONS is answered by the CORS layer, without it everything but POST is 405
    let generate = post(generate_handler).fallback(method_not_allowed);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/generate", generate)
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors { app.layer(cors_layer()) } else { app }
}

// Any origin may call POST with a JSON body
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubBackend, test_app};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn generate_post() -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/generate")
            .header(header::ORIGIN, "https://hr.example.com")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"prompt":"Write a JD","type":"job_description"}"#))
            .unwrap()
    }

    #[tokio::test]
    async fn responses_carry_cors_origin() {
        let test = test_app(StubBackend::replying("Hello"), Some("sk-test"));
        let response = router(test.state, true).oneshot(generate_post()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn preflight_advertises_methods_and_headers() {
        let test = test_app(StubBackend::replying("Hello"), Some("sk-test"));
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/generate")
            .header(header::ORIGIN, "https://hr.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = router(test.state, true).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        assert!(methods.contains("POST"));
        assert!(methods.contains("OPTIONS"));
        let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap();
        assert!(allowed.eq_ignore_ascii_case("content-type"));
    }

    #[tokio::test]
    async fn cors_can_be_disabled() {
        let test = test_app(StubBackend::replying("Hello"), Some("sk-test"));
        let response = router(test.state, false).oneshot(generate_post()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn options_is_not_allowed_without_cors() {
        let test = test_app(StubBackend::replying("Hello"), Some("sk-test"));
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/generate")
            .body(Body::empty())
            .unwrap();

        let response = router(test.state, false).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Method not allowed" }));
        assert_eq!(test.backend.calls(), 0);
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let test = test_app(StubBackend::replying("Hello"), None);
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = router(test.state, true).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn metrics_are_exposed_as_text() {
        let test = test_app(StubBackend::replying("Hello"), Some("sk-test"));
        let app = router(test.state, true);

        app.clone().oneshot(generate_post()).await.unwrap();
        let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("hr_gateway_requests_total"));
    }
}

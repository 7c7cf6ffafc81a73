//! Router construction and shared application state.

use crate::handlers;
use crate::middleware::cors_layer;
use crate::pipeline::Pipeline;
use crate::providers::ProviderFactory;
use crate::rate_limit::RateLimiter;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use grounded_types::models::GatewayConfig;
use grounded_types::GatewayError;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Maximum accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub pipeline: Arc<Pipeline>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: GatewayConfig, factory: Arc<dyn ProviderFactory>) -> Self {
        let config = Arc::new(config);
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let pipeline = Arc::new(Pipeline::new(factory, config.clone()));
        Self { config, pipeline, rate_limiter }
    }

    /// Replace the pipeline, e.g. to shorten the provider deadline in tests.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    /// Start the background sweeper for expired rate-limit windows.
    pub fn spawn_background_tasks(&self) -> tokio::task::JoinHandle<()> {
        let interval = Duration::from_secs(self.config.rate_limit.sweep_interval_secs.max(1));
        self.rate_limiter.spawn_sweeper(interval)
    }
}

/// Build the gateway router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/api/chat", post(handlers::handle_chat))
        .route("/api/chat/stream", post(handlers::handle_chat_stream))
        .route("/health", get(handlers::health_check))
        .route("/version", get(handlers::version))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| (*s).to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::error!("[Server] Handler panicked: {}", detail);

    let err = GatewayError::internal(detail);
    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.user_message(), "code": err.code() })),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-store"));
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;
    use crate::test_support::{grounded_result, StubFactory};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppState::new(
            GatewayConfig::default(),
            Arc::new(StubFactory::answering(grounded_result())),
        ))
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app()
            .oneshot(Request::get("/api/unknown").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_for_configured_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/chat")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        async fn boom() -> &'static str {
            panic!("handler exploded")
        }
        let router = Router::new().route("/boom", get(boom)).layer(CatchPanicLayer::custom(panic_response));

        let response = router
            .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert!(!json["error"].as_str().unwrap().contains("exploded"));
    }
}

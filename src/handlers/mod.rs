pub mod client;
pub mod error;
pub mod generate;
pub mod optimize;
pub mod status;

use axum::http::{header, HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::ai_service::AIService;
use crate::services::rate_limiter::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub ai: Arc<AIService>,
    pub limiter: Arc<RateLimiter>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status::status))
        .route("/test-api", get(status::test_api))
        .route("/generate", post(generate::generate))
        .route("/optimize-prompt", post(optimize::optimize_prompt))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

// 允许所有来源，预检请求直接返回 200
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}

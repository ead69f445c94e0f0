//! 规则服务 REST API
//!
//! 路由、请求处理与错误映射。

pub mod dto;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
};
use eligibility_shared::observability::middleware as obs_middleware;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::info;

pub use error::ApiError;
pub use state::AppState;

/// 规则相关路由
fn rule_routes() -> Router<AppState> {
    Router::new()
        .route("/rules", post(handlers::create_rule).get(handlers::list_rules))
        .route("/rules/compile", post(handlers::compile_rule))
        .route("/rules/evaluate", post(handlers::evaluate_rules))
        .route(
            "/rules/{id}",
            get(handlers::get_rule).delete(handlers::delete_rule),
        )
}

/// 构建完整路由（含请求 ID 与追踪中间件）
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", rule_routes())
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}

/// 根据逗号分隔的来源列表构建 CORS 层，"*" 表示允许全部来源
pub fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        info!("CORS allowed_origins: * (all origins)");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS allowed_origins: {}", allowed_origins);
    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 请求超时层，超时返回 408
pub fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

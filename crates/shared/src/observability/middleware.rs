//! HTTP 中间件：请求 ID 与请求级 span/指标
//!
//! 挂载顺序为 `request_id` 在外、`http_tracing` 在内，span 才能带上请求 ID：
//!
//! ```ignore
//! Router::new()
//!     .route("/health", get(health))
//!     .layer(middleware::from_fn(http_tracing))
//!     .layer(middleware::from_fn(request_id));
//! ```

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info_span};

use super::metrics;

/// 请求 ID 请求/响应头
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 未匹配任何路由时的指标标签
const UNMATCHED_PATH: &str = "unmatched";

/// 为请求创建 span 并记录请求数与耗时
///
/// 指标按路由模板（如 `/api/rules/{id}`）而不是实际路径打标签。
pub async fn http_tracing(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let span = info_span!(
        "http_request",
        method = %method,
        path = %request.uri().path(),
        request_id = %request_id,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let start = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;
    let elapsed = start.elapsed();

    let status = response.status().as_u16();
    span.record("status", status);
    span.record("latency_ms", elapsed.as_millis() as u64);

    metrics::record_http_request(&method, &route, status, elapsed.as_secs_f64());

    response
}

/// 沿用上游的 `x-request-id`，没有时生成 UUID；同时写入请求扩展与响应头
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// 当前请求的 ID，可在 handler 中通过 `Extension<RequestId>` 取得
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//! HTTP中间件配置

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use super::{models::HttpServerError, state::AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

/// 创建超时中间件
pub fn create_timeout_layer(secs: u64) -> TimeoutLayer {
    TimeoutLayer::new(Duration::from_secs(secs.max(1)))
}

/// 共享密钥校验：配置了 `auth.shared_secret` 时要求请求携带匹配的 `x-api-key`
pub async fn require_shared_secret(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state
        .config
        .auth
        .shared_secret
        .as_deref()
        .filter(|s| !s.is_empty())
    else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    let has_key = provided.is_some();
    let authorized =
        provided.is_some_and(|key| constant_time_eq(key.as_bytes(), expected.as_bytes()));

    if authorized {
        return next.run(req).await;
    }

    warn!(
        target: "songbridge.http",
        uri = %req.uri(),
        has_key,
        "Rejected request without valid api key"
    );
    state.record_error();
    HttpServerError::Unauthorized.into_response()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// 请求日志中间件
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        warn!(
            target: "songbridge.http",
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request failed"
        );
    } else {
        info!(
            target: "songbridge.http",
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
        assert!(constant_time_eq(b"", b""));
    }
}

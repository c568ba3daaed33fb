//! 访问日志中间件
//!
//! 纯观测，不改变控制流。

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::info;

use super::Operation;

pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let operation = request
        .extensions()
        .get::<Operation>()
        .map(|op| op.0)
        .unwrap_or("-");

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    info!(
        %method,
        %uri,
        operation,
        status = response.status().as_u16(),
        latency_ms,
        "request completed"
    );

    response
}

//! 请求指标中间件
//!
//! 纯观测，不改变控制流。

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};

use super::Operation;

pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let operation = request
        .extensions()
        .get::<Operation>()
        .map(|op| op.0)
        .unwrap_or("unknown");

    let start = Instant::now();
    let response = next.run(request).await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    let labels = [
        ("operation", operation.to_string()),
        ("status", response.status().as_u16().to_string()),
    ];

    counter!("shop_bff_requests_total", &labels).increment(1);
    histogram!("shop_bff_request_duration_ms", &labels).record(duration_ms);

    response
}

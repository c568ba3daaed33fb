//! 请求体校验中间件
//!
//! 对声明为 JSON 的请求体做语法级校验，畸形负载在业务逻辑执行前快速失败。
//! 字段级校验（手机号、密码等）仍由用例层完成。

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use lumall_errors::AppError;
use tracing::warn;

use crate::api::envelope::error_response;

/// 请求体大小上限
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub async fn validate_json(request: Request, next: Next) -> Response {
    if !is_json(&request) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            return error_response(AppError::validation("request body unreadable"));
        }
    };

    if !bytes.is_empty() && serde_json::from_slice::<serde_json::Value>(&bytes).is_err() {
        warn!(uri = %parts.uri, "malformed JSON request body");
        return error_response(AppError::validation("request body is not valid JSON"));
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    next.run(request).await
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, middleware, routing::post};
    use tower::ServiceExt;

    async fn echo(Json(value): Json<serde_json::Value>) -> Json<serde_json::Value> {
        Json(value)
    }

    fn app() -> Router {
        Router::new()
            .route("/echo", post(echo))
            .layer(middleware::from_fn(validate_json))
    }

    #[tokio::test]
    async fn test_valid_json_passes_through() {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"mobile":"13803881388"}"#))
            .unwrap();

        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"mobile": "#))
            .unwrap();

        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

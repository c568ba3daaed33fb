//! 统一响应信封
//!
//! 所有接口统一返回 `{code, message, data}` 结构，
//! 成功固定 "请求成功"，错误文案取自 Problem Details，取不到时回退 "系统错误"。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lumall_errors::AppError;
use serde::Serialize;

/// 错误回退文案
const FALLBACK_MESSAGE: &str = "系统错误";
/// 成功文案
const SUCCESS_MESSAGE: &str = "请求成功";

#[derive(Debug, Serialize)]
pub struct BaseResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

/// 成功响应包装
///
/// handler 返回 `Reply(data)` 即得到 200 信封
pub struct Reply<T>(pub T);

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        Json(BaseResponse {
            code: 200,
            message: SUCCESS_MESSAGE.to_string(),
            data: Some(self.0),
        })
        .into_response()
    }
}

/// 错误响应包装
///
/// 任何可转换为 AppError 的错误都能经 `?` 直接上浮到 handler 出口
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_response(self.0)
    }
}

pub fn error_response(err: AppError) -> Response {
    let code = err.status_code();
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = extract_message(&err);

    let body = Json(BaseResponse::<()> {
        code,
        message,
        data: None,
    });

    (status, body).into_response()
}

/// 从 Problem Details 中提取人类可读文案
fn extract_message(err: &AppError) -> String {
    serde_json::to_value(err.to_problem_details())
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

pub type ApiResult<T> = Result<Reply<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_reply_envelope() {
        #[derive(Serialize)]
        struct Data {
            id: i64,
        }

        let response = Reply(Data { id: 7 }).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;
        assert_eq!(value["code"], 200);
        assert_eq!(value["message"], "请求成功");
        assert_eq!(value["data"]["id"], 7);
    }

    #[tokio::test]
    async fn test_error_envelope_carries_detail() {
        let response = error_response(AppError::validation("mobile invalid"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let value = body_json(response).await;
        assert_eq!(value["code"], 400);
        assert_eq!(value["message"], "Validation error: mobile invalid");
        assert!(value["data"].is_null());
    }

    #[tokio::test]
    async fn test_unauthorized_envelope_status_matches_code() {
        let response = error_response(AppError::unauthorized("token expired"));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let value = body_json(response).await;
        assert_eq!(value["code"], 401);
    }
}

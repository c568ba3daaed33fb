//! 异常恢复中间件
//!
//! 下游处理过程中的任何 panic 都被转换为统一错误信封，进程不因单个请求崩溃。

use std::any::Any;

use axum::response::Response;
use lumall_errors::AppError;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

use crate::api::envelope::error_response;

pub fn recovery_layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(handle_panic as fn(Box<dyn Any + Send + 'static>) -> Response)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };

    error!(panic = detail, "request handler panicked");

    // 内部细节不外泄，统一回退文案
    error_response(AppError::internal("系统错误"))
}

//! 请求中间件链
//!
//! 固定顺序（最外层在前）：
//! recovery → 操作名标注 → 参数校验 → tracing → JWT 验证（带白名单）→ logging → metrics
//!
//! 只有 JWT 验证阶段存在分支语义（白名单放行），其余阶段对所有请求生效。

pub mod auth;
pub mod logging;
pub mod metrics;
pub mod recovery;
pub mod validate;

use std::collections::HashSet;

use axum::{extract::Request, http::Method, middleware::Next, response::Response};

/// 完整限定的操作名（service.method），由 [`tag_operation`] 注入请求扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operation(pub &'static str);

/// 操作名常量
pub mod operations {
    pub const CAPTCHA: &str = "/lumall.shop.v1.Shop/Captcha";
    pub const LOGIN: &str = "/lumall.shop.v1.Shop/Login";
    pub const REGISTER: &str = "/lumall.shop.v1.Shop/Register";
    pub const DETAIL: &str = "/lumall.shop.v1.Shop/Detail";
}

/// 请求方法 + 路径 → 操作名
pub fn route_operation(method: &Method, path: &str) -> Option<&'static str> {
    let operation = match path {
        "/v1/user/captcha" if *method == Method::GET => operations::CAPTCHA,
        "/v1/user/login" if *method == Method::POST => operations::LOGIN,
        "/v1/user/register" if *method == Method::POST => operations::REGISTER,
        "/v1/user/detail" if *method == Method::GET => operations::DETAIL,
        _ => return None,
    };
    Some(operation)
}

/// 操作名标注中间件
///
/// 必须位于认证与观测中间件的外层：路由级扩展在整条链之后才生效，
/// 操作名只能在链内自行判定并写入请求扩展。
pub async fn tag_operation(mut request: Request, next: Next) -> Response {
    if let Some(operation) = route_operation(request.method(), request.uri().path()) {
        request.extensions_mut().insert(Operation(operation));
    }
    next.run(request).await
}

/// 免认证白名单，启动时构建一次，按操作名精确匹配
pub fn whitelist() -> HashSet<&'static str> {
    HashSet::from([operations::CAPTCHA, operations::LOGIN, operations::REGISTER])
}

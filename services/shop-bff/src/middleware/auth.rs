//! JWT 认证中间件（带路由白名单）
//!
//! 白名单内的操作直接放行；其余操作必须携带 Bearer 令牌，
//! 验证失败在到达业务逻辑前拒绝，验证成功把 Claims 注入请求扩展。

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use lumall_auth_core::{Claims, TokenService};
use lumall_errors::AppError;
use tracing::{debug, warn};

use super::Operation;
use crate::api::envelope::error_response;

/// 认证中间件状态
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
    pub whitelist: Arc<HashSet<&'static str>>,
}

/// 认证 Claims 提取器
///
/// 从请求扩展中取出已验证的 Claims，应在 auth_middleware 之后使用
pub struct AuthClaims(pub Claims);

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthClaims)
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing claims in request extensions (auth_middleware may not have run)",
            ))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Claims>().cloned().map(AuthClaims))
    }
}

/// JWT 认证中间件
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let operation = request
        .extensions()
        .get::<Operation>()
        .map(|op| op.0)
        .unwrap_or("");

    // 白名单按操作名精确匹配
    if state.whitelist.contains(operation) {
        debug!(operation, "operation whitelisted, skipping token verification");
        return next.run(request).await;
    }

    let Some(token) = bearer_token(&request) else {
        warn!(operation, "missing or invalid authorization header");
        return error_response(AppError::unauthorized("missing bearer token"));
    };

    match state.tokens.verify(token) {
        Ok(claims) => {
            debug!(operation, user_id = ?claims.id, "token validated");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            warn!(operation, error = %e, "token validation failed");
            error_response(e.into())
        }
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::tag_operation;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use lumall_common::UserId;
    use tower::ServiceExt;

    async fn handler() -> &'static str {
        "OK"
    }

    fn auth_state(tokens: TokenService) -> AuthState {
        AuthState {
            tokens: Arc::new(tokens),
            whitelist: Arc::new(crate::middleware::whitelist()),
        }
    }

    // 与生产装配一致：操作名标注在认证的外层
    fn app(tokens: TokenService) -> Router {
        let state = auth_state(tokens);
        Router::new()
            .route("/v1/user/detail", get(handler))
            .route("/v1/user/captcha", get(handler))
            .route("/internal/ping", get(handler))
            .layer(middleware::from_fn_with_state(state, auth_middleware))
            .layer(middleware::from_fn(tag_operation))
    }

    fn tokens() -> TokenService {
        TokenService::new("test_secret", 3600, "lumall")
    }

    #[tokio::test]
    async fn test_valid_token_passes() {
        let svc = tokens();
        let token = svc.issue(UserId(1), "lucien", 1).unwrap();
        let app = app(tokens());

        let req = Request::builder()
            .uri("/v1/user/detail")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_rejected_before_handler() {
        let app = app(tokens());

        let req = Request::builder()
            .uri("/v1/user/detail")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected() {
        let app = app(tokens());

        let req = Request::builder()
            .uri("/v1/user/detail")
            .header("Authorization", "Bearer invalid_token")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let expired = TokenService::new("test_secret", -3600, "lumall");
        let token = expired.issue(UserId(1), "lucien", 1).unwrap();
        let app = app(tokens());

        let req = Request::builder()
            .uri("/v1/user/detail")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_whitelisted_operation_skips_verification() {
        let app = app(tokens());

        let req = Request::builder()
            .uri("/v1/user/captcha")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_route_without_operation_requires_token() {
        // 未映射到操作名的路由不享受白名单
        let app = app(tokens());

        let req = Request::builder()
            .uri("/internal/ping")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

//! HTTP 接口层
//!
//! 路由、请求/响应结构与中间件链的装配。
//! 每条业务路由携带完整限定操作名扩展，供认证白名单与观测中间件消费。

pub mod envelope;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    middleware as axum_middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::application::user::{
    CaptchaReply, LoginCommand, RegisterCommand, TokenReply, UserDetail, UserUsecase,
};
use crate::middleware::{
    auth::{AuthClaims, AuthState, auth_middleware},
    logging::logging_middleware,
    metrics::metrics_middleware,
    recovery::recovery_layer,
    tag_operation,
    validate::validate_json,
};
use envelope::{ApiResult, Reply};

/// 接口层共享状态
#[derive(Clone)]
pub struct AppState {
    pub usecase: Arc<UserUsecase>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub mobile: String,
    pub password: String,
    pub captcha_id: String,
    pub captcha: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub mobile: String,
    pub username: String,
    pub password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<TokenReply> {
    let reply = state
        .usecase
        .password_login(LoginCommand {
            mobile: req.mobile,
            password: req.password,
            captcha_id: req.captcha_id,
            captcha: req.captcha,
        })
        .await?;
    Ok(Reply(reply))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<TokenReply> {
    let reply = state
        .usecase
        .create_user(RegisterCommand {
            mobile: req.mobile,
            username: req.username,
            password: req.password,
        })
        .await?;
    Ok(Reply(reply))
}

async fn captcha(State(state): State<AppState>) -> Reply<CaptchaReply> {
    Reply(state.usecase.get_captcha())
}

async fn detail(
    State(state): State<AppState>,
    claims: Option<AuthClaims>,
) -> ApiResult<UserDetail> {
    let claims = claims.map(|c| c.0);
    let detail = state.usecase.user_detail(claims.as_ref()).await?;
    Ok(Reply(detail))
}

/// 装配完整路由
///
/// 中间件自外向内：recovery → 操作名标注 → 参数校验 → tracing →
/// JWT 验证 → logging → metrics。操作名标注必须先于认证与观测阶段。
/// /metrics 与 swagger 描述文件不经过业务中间件链。
pub fn router(state: AppState, auth: AuthState, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/v1/user/login", post(login))
        .route("/v1/user/register", post(register))
        .route("/v1/user/captcha", get(captcha))
        .route("/v1/user/detail", get(detail))
        .layer(
            ServiceBuilder::new()
                .layer(recovery_layer())
                .layer(axum_middleware::from_fn(tag_operation))
                .layer(axum_middleware::from_fn(validate_json))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
                .layer(axum_middleware::from_fn(logging_middleware))
                .layer(axum_middleware::from_fn(metrics_middleware)),
        )
        .with_state(state);

    let ops_routes = Router::new()
        .route(
            "/metrics",
            get(move || {
                let handle = metrics_handle.clone();
                async move { handle.render() }
            }),
        )
        .route(
            "/q/shop.swagger.json",
            get(|| async { include_str!("../../openapi/shop.swagger.json") }),
        );

    api_routes.merge(ops_routes).layer(CorsLayer::permissive())
}

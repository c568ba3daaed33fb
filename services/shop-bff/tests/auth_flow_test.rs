//! 认证全链路集成测试
//!
//! 用内存仓储替代数据库，走完整路由与中间件链。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use lumall_auth_core::TokenService;
use lumall_common::{Authority, UserId};
use lumall_errors::{AppError, AppResult};
use metrics_exporter_prometheus::PrometheusBuilder;
use tower::ServiceExt;

use shop_bff::api::{self, AppState};
use shop_bff::application::user::UserUsecase;
use shop_bff::domain::password::HashedPassword;
use shop_bff::domain::user::{NewUser, User, UserRepository};
use shop_bff::infrastructure::captcha::CaptchaStore;
use shop_bff::middleware::auth::AuthState;
use shop_bff::middleware::whitelist;

const THIRTY_DAYS: i64 = 2_592_000;

/// 内存用户仓储，手机号为唯一键
struct MemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
    next_id: Mutex<i64>,
}

impl MemoryUserRepository {
    fn seeded() -> Self {
        let hash = HashedPassword::from_plain("123456").unwrap();
        let user = User {
            id: UserId(1),
            mobile: "13803881388".to_string(),
            password_hash: hash.as_str().to_string(),
            nick_name: "lucien".to_string(),
            authority: Authority::User,
        };
        Self {
            users: Mutex::new(HashMap::from([(user.mobile.clone(), user)])),
            next_id: Mutex::new(2),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.mobile) {
            return Err(AppError::conflict("user already exists"));
        }

        let hash = HashedPassword::from_plain(&user.password)
            .map_err(|e| AppError::internal(e.to_string()))?;
        let mut next_id = self.next_id.lock().unwrap();
        let created = User {
            id: UserId(*next_id),
            mobile: user.mobile.clone(),
            password_hash: hash.as_str().to_string(),
            nick_name: user.nick_name,
            authority: Authority::default(),
        };
        *next_id += 1;
        users.insert(user.mobile, created.clone());
        Ok(created)
    }

    async fn user_by_mobile(&self, mobile: &str) -> AppResult<User> {
        self.users
            .lock()
            .unwrap()
            .get(mobile)
            .cloned()
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    async fn user_by_id(&self, id: UserId) -> AppResult<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    async fn check_password(&self, plain: &str, password_hash: &str) -> AppResult<bool> {
        let hashed = HashedPassword::from_hash(password_hash.to_string());
        Ok(hashed.verify(plain).map_err(AppError::from)?)
    }
}

fn test_app() -> Router {
    let tokens = Arc::new(TokenService::new("integration_secret", THIRTY_DAYS, "lumall"));
    let captcha = Arc::new(CaptchaStore::new(6, Duration::from_secs(300)));
    let repo = Arc::new(MemoryUserRepository::seeded());
    let usecase = Arc::new(UserUsecase::new(repo, captcha, tokens.clone()));

    let auth = AuthState {
        tokens,
        whitelist: Arc::new(whitelist()),
    };
    let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

    api::router(AppState { usecase }, auth, metrics_handle)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn get_captcha(app: &Router) -> (String, String) {
    let req = Request::builder()
        .uri("/v1/user/captcha")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let value = json_body(response).await;
    assert_eq!(value["code"], 200);
    assert_eq!(value["message"], "请求成功");

    let captcha_id = value["data"]["captcha_id"].as_str().unwrap().to_string();
    let ans = value["data"]["ans"].as_str().unwrap().to_string();
    (captcha_id, ans)
}

async fn login(app: &Router, captcha_id: &str, answer: &str) -> axum::response::Response {
    let body = serde_json::json!({
        "mobile": "13803881388",
        "password": "123456",
        "captcha_id": captcha_id,
        "captcha": answer,
    });
    let req = Request::builder()
        .method("POST")
        .uri("/v1/user/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

#[tokio::test]
async fn test_captcha_then_login_succeeds() {
    let app = test_app();
    let (captcha_id, ans) = get_captcha(&app).await;

    let before = Utc::now().timestamp();
    let response = login(&app, &captcha_id, &ans).await;
    let after = Utc::now().timestamp();

    assert_eq!(response.status(), StatusCode::OK);
    let value = json_body(response).await;
    assert_eq!(value["code"], 200);
    assert_eq!(value["message"], "请求成功");
    assert_eq!(value["data"]["mobile"], "13803881388");
    assert!(!value["data"]["token"].as_str().unwrap().is_empty());

    let expired_at = value["data"]["expired_at"].as_i64().unwrap();
    assert!(expired_at >= before + THIRTY_DAYS);
    assert!(expired_at <= after + THIRTY_DAYS);
}

#[tokio::test]
async fn test_captcha_is_single_use() {
    let app = test_app();
    let (captcha_id, ans) = get_captcha(&app).await;

    let first = login(&app, &captcha_id, &ans).await;
    assert_eq!(first.status(), StatusCode::OK);

    // 同一挑战第二次使用必须失败
    let second = login(&app, &captcha_id, &ans).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let value = json_body(second).await;
    assert_eq!(value["code"], 400);
    assert!(value["data"].is_null());
}

#[tokio::test]
async fn test_detail_without_token_is_unauthorized_envelope() {
    let app = test_app();

    let req = Request::builder()
        .uri("/v1/user/detail")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let value = json_body(response).await;
    assert_eq!(value["code"], 401);
    assert!(value["data"].is_null());
}

#[tokio::test]
async fn test_detail_with_login_token() {
    let app = test_app();
    let (captcha_id, ans) = get_captcha(&app).await;

    let response = login(&app, &captcha_id, &ans).await;
    let value = json_body(response).await;
    let token = value["data"]["token"].as_str().unwrap().to_string();

    let req = Request::builder()
        .uri("/v1/user/detail")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let value = json_body(response).await;
    assert_eq!(value["data"]["id"], 1);
    assert_eq!(value["data"]["mobile"], "13803881388");
    assert_eq!(value["data"]["nick_name"], "lucien");
}

#[tokio::test]
async fn test_register_mobile_too_long_is_rejected() {
    let app = test_app();

    let body = serde_json::json!({
        "mobile": "13803881388999",
        "username": "newbie",
        "password": "123456",
    });
    let req = Request::builder()
        .method("POST")
        .uri("/v1/user/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value = json_body(response).await;
    assert_eq!(value["code"], 400);
}

#[tokio::test]
async fn test_register_returns_login_state() {
    let app = test_app();

    let body = serde_json::json!({
        "mobile": "13900000000",
        "username": "newbie",
        "password": "654321",
    });
    let req = Request::builder()
        .method("POST")
        .uri("/v1/user/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let value = json_body(response).await;
    assert_eq!(value["data"]["mobile"], "13900000000");
    assert_eq!(value["data"]["username"], "newbie");
    let token = value["data"]["token"].as_str().unwrap().to_string();

    // 注册即登录：返回的令牌可直接访问受保护接口
    let req = Request::builder()
        .uri("/v1/user/detail")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_rejected_before_handler() {
    let app = test_app();

    let req = Request::builder()
        .method("POST")
        .uri("/v1/user/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"mobile": "#))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value = json_body(response).await;
    assert_eq!(value["code"], 400);
    assert!(value["data"].is_null());
}

#[tokio::test]
async fn test_metrics_endpoint_is_open() {
    let app = test_app();

    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

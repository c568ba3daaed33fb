//! Lumall Shop BFF

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lumall_auth_core::TokenService;
use lumall_config::AppConfig;
use lumall_telemetry::{init_metrics, init_tracing, init_tracing_json};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use shop_bff::api::{self, AppState};
use shop_bff::application::user::UserUsecase;
use shop_bff::infrastructure::captcha::CaptchaStore;
use shop_bff::infrastructure::persistence::PostgresUserRepository;
use shop_bff::middleware::auth::AuthState;
use shop_bff::middleware::whitelist;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // 加载配置
    let config = AppConfig::load("config")?;

    // 初始化 tracing，生产环境用 JSON 格式
    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }
    let metrics_handle = init_metrics();

    info!(app = %config.app_name, env = %config.app_env, "Starting Shop BFF");

    // 数据库连接池与迁移
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(config.database.url.expose_secret())
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // 装配依赖
    let tokens = Arc::new(TokenService::new(
        config.jwt.secret.expose_secret(),
        config.jwt.expires_in,
        config.jwt.issuer.clone(),
    ));
    let captcha = Arc::new(CaptchaStore::new(
        config.captcha.code_length,
        Duration::from_secs(config.captcha.expires_secs),
    ));
    let repo = Arc::new(PostgresUserRepository::new(pool));
    let usecase = Arc::new(UserUsecase::new(repo, captcha, tokens.clone()));

    let auth = AuthState {
        tokens,
        whitelist: Arc::new(whitelist()),
    };

    let app = api::router(AppState { usecase }, auth, metrics_handle);

    // 启动服务器
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!(%addr, "HTTP server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

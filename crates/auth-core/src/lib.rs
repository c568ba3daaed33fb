//! lumall-auth-core - 认证核心库
//!
//! JWT Claims 与令牌签发/验证

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use lumall_common::UserId;
use lumall_errors::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 令牌错误
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired or not yet valid")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => AppError::internal(msg),
            other => AppError::unauthorized(other.to_string()),
        }
    }
}

/// JWT Claims
///
/// 主体 ID 在解码时按可缺失处理：验证器只负责签名与时间窗口，
/// 字段的存在性由调用方通过 [`Claims::user_id`] 再校验。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// 显示昵称
    #[serde(default)]
    pub nick_name: String,
    /// 权限等级
    #[serde(default)]
    pub authority_id: i32,
    /// Not before
    pub nbf: i64,
    /// Expiration time
    pub exp: i64,
    /// Issuer
    #[serde(default)]
    pub iss: String,
}

impl Claims {
    pub fn new(
        user_id: UserId,
        nick_name: &str,
        authority_id: i32,
        expires_in_secs: i64,
        issuer: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Some(user_id.0),
            nick_name: nick_name.to_string(),
            authority_id,
            nbf: now.timestamp(),
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            iss: issuer.to_string(),
        }
    }

    /// 主体 ID，缺失时返回 None，由调用方决定如何拒绝
    pub fn user_id(&self) -> Option<UserId> {
        self.id.map(UserId)
    }
}

/// Token 服务
///
/// 签名密钥在配置加载后只读，多请求并发签发/验证无需加锁。
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: i64,
    issuer: String,
}

impl TokenService {
    pub fn new(secret: &str, expires_in: i64, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
            issuer: issuer.into(),
        }
    }

    /// 签发令牌
    ///
    /// nbf = now, exp = now + expires_in, iss = 固定标识
    pub fn issue(
        &self,
        user_id: UserId,
        nick_name: &str,
        authority_id: i32,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(user_id, nick_name, authority_id, self.expires_in, &self.issuer);
        self.sign(&claims)
    }

    /// 用给定 Claims 签发令牌
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// 验证令牌
    ///
    /// 签名不符 → InvalidSignature；当前时间在 [nbf, exp] 之外 → Expired。
    /// 无吊销机制：签名与时间窗口有效的令牌始终被接受。
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0; // 不允许时间偏差

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                    ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
                        TokenError::Expired
                    }
                    _ => TokenError::Malformed(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    /// 令牌有效期（秒）
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }
}

//! 服务错误定义

use lumall_errors::AppError;
use thiserror::Error;

/// 用户用例错误
#[derive(Debug, Error)]
pub enum UserError {
    #[error("mobile invalid")]
    MobileInvalid,

    #[error("username invalid")]
    UsernameInvalid,

    #[error("password invalid")]
    PasswordInvalid,

    #[error("verification code error")]
    CaptchaInvalid,

    #[error("user not found")]
    UserNotFound,

    #[error("login failed")]
    LoginFailed,

    #[error("generate token failed")]
    GenerateTokenFailed,

    #[error("authentication failed")]
    AuthFailed,

    /// 数据层错误原样上抛，不做二次解释
    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::MobileInvalid
            | UserError::UsernameInvalid
            | UserError::PasswordInvalid
            | UserError::CaptchaInvalid => AppError::validation(err.to_string()),
            UserError::UserNotFound => AppError::not_found(err.to_string()),
            UserError::LoginFailed | UserError::AuthFailed => AppError::unauthorized(err.to_string()),
            UserError::GenerateTokenFailed => AppError::internal(err.to_string()),
            UserError::Repository(inner) => inner,
        }
    }
}

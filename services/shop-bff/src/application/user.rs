//! 用户用例
//!
//! 登录、注册、验证码签发与当前用户查询的编排逻辑。
//! 纯读后答复流程：本层不直接写任何状态（验证码的 clear-on-use 除外）。

use std::sync::Arc;

use chrono::Utc;
use lumall_auth_core::{Claims, TokenService};
use serde::Serialize;

use crate::domain::user::{NewUser, User, UserRepository};
use crate::error::UserError;
use crate::infrastructure::captcha::CaptchaStore;
use crate::observability;

/// 登录请求
#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub mobile: String,
    pub password: String,
    pub captcha_id: String,
    pub captcha: String,
}

/// 注册请求
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub mobile: String,
    pub username: String,
    pub password: String,
}

/// 登录/注册成功后的认证答复
#[derive(Debug, Clone, Serialize)]
pub struct TokenReply {
    pub id: i64,
    pub mobile: String,
    pub username: String,
    pub token: String,
    pub expired_at: i64,
}

/// 验证码答复
#[derive(Debug, Clone, Serialize)]
pub struct CaptchaReply {
    pub captcha_id: String,
    pub pic_path: String,
    pub ans: String,
}

/// 用户详情答复
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    pub id: i64,
    pub nick_name: String,
    pub mobile: String,
}

/// 用户用例
pub struct UserUsecase {
    repo: Arc<dyn UserRepository>,
    captcha: Arc<CaptchaStore>,
    tokens: Arc<TokenService>,
}

impl UserUsecase {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        captcha: Arc<CaptchaStore>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            repo,
            captcha,
            tokens,
        }
    }

    /// 密码登录
    ///
    /// 表单校验（手机号→密码）必须先于任何 I/O；验证码无论对错一次即作废。
    pub async fn password_login(&self, cmd: LoginCommand) -> Result<TokenReply, UserError> {
        if cmd.mobile.is_empty() {
            return Err(UserError::MobileInvalid);
        }
        if cmd.password.is_empty() {
            return Err(UserError::UsernameInvalid);
        }
        if !self.captcha.verify(&cmd.captcha_id, &cmd.captcha, true) {
            return Err(UserError::CaptchaInvalid);
        }

        let user = self
            .repo
            .user_by_mobile(&cmd.mobile)
            .await
            .map_err(|_| UserError::UserNotFound)?;

        // 校验出错与校验不匹配是两类错误，保持区分
        let matched = self
            .repo
            .check_password(&cmd.password, &user.password_hash)
            .await
            .map_err(|_| UserError::PasswordInvalid)?;
        if !matched {
            observability::record_login_attempt(false);
            return Err(UserError::LoginFailed);
        }

        observability::record_login_attempt(true);
        self.issue_reply(&user)
    }

    /// 注册，创建成功后直接返回登录态
    pub async fn create_user(&self, cmd: RegisterCommand) -> Result<TokenReply, UserError> {
        let new_user = validate_register(cmd)?;

        // 手机号唯一性由数据层保证，冲突错误原样上抛
        let user = self.repo.create_user(new_user).await?;

        observability::record_user_registered();
        self.issue_reply(&user)
    }

    /// 签发验证码挑战
    pub fn get_captcha(&self) -> CaptchaReply {
        let info = self.captcha.new_challenge();
        observability::record_captcha_issued();
        CaptchaReply {
            captcha_id: info.captcha_id,
            pic_path: info.pic_path,
            ans: info.ans,
        }
    }

    /// 当前用户详情
    ///
    /// Claims 由认证中间件注入；主体 ID 缺失或类型不符 → AuthFailed。
    pub async fn user_detail(&self, claims: Option<&Claims>) -> Result<UserDetail, UserError> {
        let claims = claims.ok_or(UserError::AuthFailed)?;
        let user_id = claims.user_id().ok_or(UserError::AuthFailed)?;

        let user = self.repo.user_by_id(user_id).await?;

        Ok(UserDetail {
            id: user.id.0,
            nick_name: user.nick_name,
            mobile: user.mobile,
        })
    }

    fn issue_reply(&self, user: &User) -> Result<TokenReply, UserError> {
        let token = self
            .tokens
            .issue(user.id, &user.nick_name, user.authority.as_i32())
            .map_err(|_| UserError::GenerateTokenFailed)?;

        Ok(TokenReply {
            id: user.id.0,
            mobile: user.mobile.clone(),
            username: user.nick_name.clone(),
            token,
            expired_at: Utc::now().timestamp() + self.tokens.expires_in(),
        })
    }
}

/// 注册表单校验：手机号（非空且 ≤ 13）→ 昵称 → 密码，全部先于 I/O
fn validate_register(cmd: RegisterCommand) -> Result<NewUser, UserError> {
    if cmd.mobile.is_empty() || cmd.mobile.len() > 13 {
        return Err(UserError::MobileInvalid);
    }
    if cmd.username.is_empty() {
        return Err(UserError::UsernameInvalid);
    }
    if cmd.password.is_empty() {
        return Err(UserError::PasswordInvalid);
    }
    Ok(NewUser {
        mobile: cmd.mobile,
        nick_name: cmd.username,
        password: cmd.password,
    })
}

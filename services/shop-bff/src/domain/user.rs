//! 用户领域模型与仓储接口

use async_trait::async_trait;
use lumall_common::{Authority, UserId};
use lumall_errors::AppResult;

/// 用户凭证记录
///
/// 手机号是唯一自然键；记录由外部数据层持有，本服务只读。
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub mobile: String,
    pub password_hash: String,
    pub nick_name: String,
    pub authority: Authority,
}

/// 新建用户的输入（密码为明文，仓储负责哈希）
#[derive(Debug, Clone)]
pub struct NewUser {
    pub mobile: String,
    pub nick_name: String,
    pub password: String,
}

/// 用户仓储接口
///
/// 手机号唯一性由实现方保证（create_user 冲突时返回错误）。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    async fn user_by_mobile(&self, mobile: &str) -> AppResult<User>;

    async fn user_by_id(&self, id: UserId) -> AppResult<User>;

    /// 校验明文密码是否与存储哈希匹配
    async fn check_password(&self, plain: &str, password_hash: &str) -> AppResult<bool>;
}

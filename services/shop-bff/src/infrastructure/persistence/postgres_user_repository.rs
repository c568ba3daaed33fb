//! PostgreSQL 用户仓储实现

use async_trait::async_trait;
use lumall_common::{Authority, UserId};
use lumall_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::password::HashedPassword;
use crate::domain::user::{NewUser, User, UserRepository};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    mobile: String,
    password_hash: String,
    nick_name: String,
    authority_id: i32,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: UserId(self.id),
            mobile: self.mobile,
            password_hash: self.password_hash,
            nick_name: self.nick_name,
            authority: Authority::from_i32(self.authority_id),
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let password_hash = HashedPassword::from_plain(&user.password)?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (mobile, password_hash, nick_name, authority_id)
            VALUES ($1, $2, $3, 1)
            RETURNING id, mobile, password_hash, nick_name, authority_id
            "#,
        )
        .bind(&user.mobile)
        .bind(password_hash.as_str())
        .bind(&user.nick_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // 唯一索引冲突：手机号已注册
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict(format!("user already exists: {}", user.mobile))
            }
            _ => AppError::database(format!("Failed to create user: {}", e)),
        })?;

        Ok(row.into_user())
    }

    async fn user_by_mobile(&self, mobile: &str) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, mobile, password_hash, nick_name, authority_id
            FROM users
            WHERE mobile = $1
            "#,
        )
        .bind(mobile)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {}", e)))?;

        row.map(UserRow::into_user)
            .ok_or_else(|| AppError::not_found(format!("user not found: {}", mobile)))
    }

    async fn user_by_id(&self, id: UserId) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, mobile, password_hash, nick_name, authority_id
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {}", e)))?;

        row.map(UserRow::into_user)
            .ok_or_else(|| AppError::not_found(format!("user not found: {}", id)))
    }

    async fn check_password(&self, plain: &str, password_hash: &str) -> AppResult<bool> {
        let hashed = HashedPassword::from_hash(password_hash.to_string());
        Ok(hashed.verify(plain)?)
    }
}

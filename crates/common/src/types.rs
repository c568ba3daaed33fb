//! 通用类型定义

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// 用户 ID（数据层自增主键）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
pub struct UserId(pub i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 用户权限等级
///
/// 1: 普通用户, 2: 管理员
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authority {
    User,
    Admin,
}

impl Authority {
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::User => 1,
            Self::Admin => 2,
        }
    }

    /// 未知等级按普通用户处理
    pub fn from_i32(value: i32) -> Self {
        match value {
            2 => Self::Admin,
            _ => Self::User,
        }
    }
}

impl Default for Authority {
    fn default() -> Self {
        Self::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId(42).to_string(), "42");
    }

    #[test]
    fn test_authority_round_trip() {
        assert_eq!(Authority::from_i32(Authority::Admin.as_i32()), Authority::Admin);
        assert_eq!(Authority::from_i32(0), Authority::User);
    }
}

//! 领域层：用户模型、仓储接口与密码值对象

pub mod password;
pub mod user;

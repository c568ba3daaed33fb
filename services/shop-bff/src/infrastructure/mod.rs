//! 基础设施层：验证码存储与持久化实现

pub mod captcha;
pub mod persistence;

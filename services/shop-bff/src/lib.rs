//! shop-bff - 商城 BFF 服务
//!
//! 对外暴露用户侧 HTTP 接口，所有入站请求经过统一中间件链：
//! recovery → 操作名标注 → 参数校验 → tracing → JWT 验证（带白名单）→ logging → metrics

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod middleware;
pub mod observability;

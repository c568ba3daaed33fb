//! 应用层：用户用例编排

pub mod user;

pub use user::{
    CaptchaReply, LoginCommand, RegisterCommand, TokenReply, UserDetail, UserUsecase,
};

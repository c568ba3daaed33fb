//! 持久化实现

mod postgres_user_repository;

pub use postgres_user_repository::PostgresUserRepository;

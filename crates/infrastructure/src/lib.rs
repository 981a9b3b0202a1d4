//! 基础设施层：持久化端口的 Postgres 实现，
//! 以及无数据库部署用的占位实现。

pub mod db;
pub mod unavailable;

pub use db::{create_pool, DbPool};
pub use unavailable::UnavailableStore;

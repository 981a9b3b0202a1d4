//! 数据库连接与仓库实现。

use domain::RepositoryError;
use sqlx::{Pool, Postgres};

pub mod repositories;

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str, max_size: u32) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_size)
        .connect(database_url)
        .await
}

/// sqlx 错误到仓库错误的统一映射。
/// 连接层面的故障映射为 `Unavailable`，让上层走降级路径。
pub(crate) fn map_sqlx(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Unavailable
        }
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        other => RepositoryError::Database(other.to_string()),
    }
}

//! 违规计数仓库实现

use application::StrikeRepository;
use async_trait::async_trait;
use domain::{RepositoryError, RoomName, StrikeCount, Timestamp, UserId};

use crate::db::{map_sqlx, DbPool};

pub struct PostgresStrikeRepository {
    pool: DbPool,
}

impl PostgresStrikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StrikeRepository for PostgresStrikeRepository {
    async fn increment_and_get(
        &self,
        room: &RoomName,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<StrikeCount, RepositoryError> {
        // 单条原子 upsert，并发违规不会丢失计数
        let total = sqlx::query_scalar::<_, i32>(
            r#"INSERT INTO strikes (room, user_id, strikes, updated_at)
               VALUES ($1, $2, 1, $3)
               ON CONFLICT (room, user_id) DO UPDATE
               SET strikes = strikes.strikes + 1,
                   updated_at = EXCLUDED.updated_at
               RETURNING strikes"#,
        )
        .bind(room.as_str())
        .bind(user_id.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(StrikeCount {
            room: room.clone(),
            user_id: user_id.clone(),
            strikes: total.max(0) as u32,
            updated_at: now,
        })
    }
}

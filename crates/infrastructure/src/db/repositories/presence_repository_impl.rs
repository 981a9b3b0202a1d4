//! 在线状态仓库实现

use application::PresenceRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{DisplayName, Presence, RepositoryError, RoomName, Timestamp, UserId};
use sqlx::FromRow;

use crate::db::{map_sqlx, DbPool};

#[derive(Debug, Clone, FromRow)]
struct DbPresence {
    room: String,
    user_id: String,
    name: String,
    is_online: bool,
    last_seen: DateTime<Utc>,
}

impl TryFrom<DbPresence> for Presence {
    type Error = RepositoryError;

    fn try_from(row: DbPresence) -> Result<Self, Self::Error> {
        let user_id = UserId::parse(row.user_id)
            .map_err(|err| RepositoryError::Database(err.to_string()))?;
        Ok(Presence {
            room: RoomName::sanitize(row.room),
            user_id,
            name: DisplayName::sanitize(row.name),
            is_online: row.is_online,
            last_seen: row.last_seen,
        })
    }
}

pub struct PostgresPresenceRepository {
    pool: DbPool,
}

impl PostgresPresenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PresenceRepository for PostgresPresenceRepository {
    async fn upsert(&self, presence: Presence) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO presence (room, user_id, name, is_online, last_seen)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (room, user_id) DO UPDATE
               SET name = EXCLUDED.name,
                   is_online = EXCLUDED.is_online,
                   last_seen = EXCLUDED.last_seen"#,
        )
        .bind(presence.room.as_str())
        .bind(presence.user_id.as_str())
        .bind(presence.name.as_str())
        .bind(presence.is_online)
        .bind(presence.last_seen)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn set_offline(
        &self,
        room: &RoomName,
        user_id: &UserId,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"UPDATE presence SET is_online = FALSE, last_seen = $3
               WHERE room = $1 AND user_id = $2"#,
        )
        .bind(room.as_str())
        .bind(user_id.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn list_for_room(
        &self,
        room: &RoomName,
        limit: u32,
    ) -> Result<Vec<Presence>, RepositoryError> {
        let rows = sqlx::query_as::<_, DbPresence>(
            r#"SELECT room, user_id, name, is_online, last_seen
               FROM presence WHERE room = $1
               ORDER BY is_online DESC, last_seen DESC
               LIMIT $2"#,
        )
        .bind(room.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(Presence::try_from).collect()
    }
}

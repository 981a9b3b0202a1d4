//! 房间仓库实现

use application::RoomRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{RepositoryError, Room, RoomName, UserId};
use sqlx::FromRow;

use crate::db::{map_sqlx, DbPool};

/// 数据库房间模型
#[derive(Debug, Clone, FromRow)]
struct DbRoom {
    name: String,
    invite_token: String,
    owner: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<DbRoom> for Room {
    type Error = RepositoryError;

    fn try_from(row: DbRoom) -> Result<Self, Self::Error> {
        let owner = UserId::parse(row.owner)
            .map_err(|err| RepositoryError::Database(err.to_string()))?;
        Ok(Room::new(
            RoomName::sanitize(row.name),
            row.invite_token,
            owner,
            row.created_at,
        ))
    }
}

pub struct PostgresRoomRepository {
    pool: DbPool,
}

impl PostgresRoomRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PostgresRoomRepository {
    async fn find(&self, name: &RoomName) -> Result<Option<Room>, RepositoryError> {
        let row = sqlx::query_as::<_, DbRoom>(
            r#"SELECT name, invite_token, owner, created_at FROM rooms WHERE name = $1"#,
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(Room::try_from).transpose()
    }

    async fn find_or_create(&self, room: Room) -> Result<Room, RepositoryError> {
        // 并发首次加入时只有一个 INSERT 生效，随后统一读回生效行
        sqlx::query(
            r#"INSERT INTO rooms (name, invite_token, owner, created_at)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (name) DO NOTHING"#,
        )
        .bind(room.name.as_str())
        .bind(&room.invite_token)
        .bind(room.owner.as_str())
        .bind(room.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        match self.find(&room.name).await? {
            Some(stored) => Ok(stored),
            None => Err(RepositoryError::NotFound),
        }
    }
}

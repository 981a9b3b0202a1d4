//! 消息仓库实现

use application::MessageRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{ChatMessage, DisplayName, RepositoryError, RoomName, UserId};
use sqlx::FromRow;

use crate::db::{map_sqlx, DbPool};

/// 数据库消息模型
#[derive(Debug, Clone, FromRow)]
struct DbMessage {
    room: String,
    user_id: String,
    name: String,
    text: String,
    sent_at: DateTime<Utc>,
}

impl TryFrom<DbMessage> for ChatMessage {
    type Error = RepositoryError;

    fn try_from(row: DbMessage) -> Result<Self, Self::Error> {
        let user_id = UserId::parse(row.user_id)
            .map_err(|err| RepositoryError::Database(err.to_string()))?;
        Ok(ChatMessage::new(
            RoomName::sanitize(row.room),
            user_id,
            DisplayName::sanitize(row.name),
            row.text,
            row.sent_at,
        ))
    }
}

pub struct PostgresMessageRepository {
    pool: DbPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO messages (room, user_id, name, text, sent_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(message.room.as_str())
        .bind(message.user_id.as_str())
        .bind(message.name.as_str())
        .bind(&message.text)
        .bind(message.sent_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn recent(
        &self,
        room: &RoomName,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, DbMessage>(
            r#"SELECT room, user_id, name, text, sent_at
               FROM messages WHERE room = $1
               ORDER BY sent_at DESC, id DESC
               LIMIT $2"#,
        )
        .bind(room.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        // 查询按最新优先取，交付给客户端时还原成时间正序
        let mut messages = rows
            .into_iter()
            .map(ChatMessage::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }
}

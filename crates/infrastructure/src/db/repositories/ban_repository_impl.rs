//! 封禁仓库实现
//!
//! 用户封禁按 (room, user_id) 维度，IP 封禁全局生效。
//! `until_at` 为 NULL 表示永久封禁。

use application::BanRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{IpBan, RepositoryError, RoomName, Timestamp, UserBan, UserId};
use sqlx::FromRow;

use crate::db::{map_sqlx, DbPool};

#[derive(Debug, Clone, FromRow)]
struct DbUserBan {
    room: String,
    user_id: String,
    reason: String,
    until_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DbUserBan> for UserBan {
    type Error = RepositoryError;

    fn try_from(row: DbUserBan) -> Result<Self, Self::Error> {
        let user_id = UserId::parse(row.user_id)
            .map_err(|err| RepositoryError::Database(err.to_string()))?;
        Ok(UserBan {
            room: RoomName::sanitize(row.room),
            user_id,
            reason: row.reason,
            until: row.until_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct DbIpBan {
    ip: String,
    reason: String,
    until_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<DbIpBan> for IpBan {
    fn from(row: DbIpBan) -> Self {
        IpBan {
            ip: row.ip,
            reason: row.reason,
            until: row.until_at,
            created_at: row.created_at,
        }
    }
}

pub struct PostgresBanRepository {
    pool: DbPool,
}

impl PostgresBanRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BanRepository for PostgresBanRepository {
    async fn find_active_user_ban(
        &self,
        room: &RoomName,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Option<UserBan>, RepositoryError> {
        let row = sqlx::query_as::<_, DbUserBan>(
            r#"SELECT room, user_id, reason, until_at, created_at
               FROM user_bans
               WHERE room = $1 AND user_id = $2
                 AND (until_at IS NULL OR until_at > $3)"#,
        )
        .bind(room.as_str())
        .bind(user_id.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(UserBan::try_from).transpose()
    }

    async fn find_active_ip_ban(
        &self,
        ip: &str,
        now: Timestamp,
    ) -> Result<Option<IpBan>, RepositoryError> {
        let row = sqlx::query_as::<_, DbIpBan>(
            r#"SELECT ip, reason, until_at, created_at
               FROM ip_bans
               WHERE ip = $1 AND (until_at IS NULL OR until_at > $2)"#,
        )
        .bind(ip)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(IpBan::from))
    }

    async fn upsert_user_ban(&self, ban: UserBan) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO user_bans (room, user_id, reason, until_at, created_at)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (room, user_id) DO UPDATE
               SET reason = EXCLUDED.reason,
                   until_at = EXCLUDED.until_at,
                   created_at = EXCLUDED.created_at"#,
        )
        .bind(ban.room.as_str())
        .bind(ban.user_id.as_str())
        .bind(&ban.reason)
        .bind(ban.until)
        .bind(ban.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn upsert_ip_ban(&self, ban: IpBan) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO ip_bans (ip, reason, until_at, created_at)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (ip) DO UPDATE
               SET reason = EXCLUDED.reason,
                   until_at = EXCLUDED.until_at,
                   created_at = EXCLUDED.created_at"#,
        )
        .bind(&ban.ip)
        .bind(&ban.reason)
        .bind(ban.until)
        .bind(ban.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}

//! 内存实现的持久化端口（用于测试和无数据库联调）。
//!
//! 语义与 Postgres 实现对齐：upsert 按主键覆盖、
//! 违规计数在单把锁内完成读改写。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use domain::{
    AbuseReport, ChatMessage, IpBan, Presence, RepositoryError, Room, RoomName, StrikeCount,
    Timestamp, UserBan, UserId,
};

use crate::repository::{
    BanRepository, MessageRepository, PresenceRepository, ReportRepository, RoomRepository,
    StrikeRepository,
};

#[derive(Default)]
pub struct MemoryRoomRepository {
    rooms: Mutex<HashMap<String, Room>>,
}

#[async_trait]
impl RoomRepository for MemoryRoomRepository {
    async fn find(&self, name: &RoomName) -> Result<Option<Room>, RepositoryError> {
        Ok(self.rooms.lock().await.get(name.as_str()).cloned())
    }

    async fn find_or_create(&self, room: Room) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let stored = rooms
            .entry(room.name.as_str().to_owned())
            .or_insert(room)
            .clone();
        Ok(stored)
    }
}

#[derive(Default)]
pub struct MemoryMessageRepository {
    messages: Mutex<Vec<ChatMessage>>,
}

impl MemoryMessageRepository {
    /// 测试断言用：某房间当前持久化的消息数。
    pub async fn count_for_room(&self, room: &RoomName) -> usize {
        self.messages
            .lock()
            .await
            .iter()
            .filter(|m| &m.room == room)
            .count()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        self.messages.lock().await.push(message);
        Ok(())
    }

    async fn recent(
        &self,
        room: &RoomName,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        let mut recent: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| &m.room == room)
            .cloned()
            .collect();
        let skip = recent.len().saturating_sub(limit as usize);
        recent.drain(..skip);
        Ok(recent)
    }
}

#[derive(Default)]
pub struct MemoryPresenceRepository {
    rows: Mutex<HashMap<(String, String), Presence>>,
}

#[async_trait]
impl PresenceRepository for MemoryPresenceRepository {
    async fn upsert(&self, presence: Presence) -> Result<(), RepositoryError> {
        let key = (
            presence.room.as_str().to_owned(),
            presence.user_id.as_str().to_owned(),
        );
        self.rows.lock().await.insert(key, presence);
        Ok(())
    }

    async fn set_offline(
        &self,
        room: &RoomName,
        user_id: &UserId,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let key = (room.as_str().to_owned(), user_id.as_str().to_owned());
        if let Some(row) = self.rows.lock().await.get_mut(&key) {
            row.is_online = false;
            row.last_seen = at;
        }
        Ok(())
    }

    async fn list_for_room(
        &self,
        room: &RoomName,
        limit: u32,
    ) -> Result<Vec<Presence>, RepositoryError> {
        let rows = self.rows.lock().await;
        let mut list: Vec<Presence> = rows
            .values()
            .filter(|p| &p.room == room)
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            b.is_online
                .cmp(&a.is_online)
                .then(b.last_seen.cmp(&a.last_seen))
        });
        list.truncate(limit as usize);
        Ok(list)
    }
}

#[derive(Default)]
pub struct MemoryBanRepository {
    user_bans: Mutex<HashMap<(String, String), UserBan>>,
    ip_bans: Mutex<HashMap<String, IpBan>>,
}

impl MemoryBanRepository {
    pub async fn user_ban_count(&self) -> usize {
        self.user_bans.lock().await.len()
    }

    pub async fn ip_ban_count(&self) -> usize {
        self.ip_bans.lock().await.len()
    }
}

#[async_trait]
impl BanRepository for MemoryBanRepository {
    async fn find_active_user_ban(
        &self,
        room: &RoomName,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Option<UserBan>, RepositoryError> {
        let key = (room.as_str().to_owned(), user_id.as_str().to_owned());
        Ok(self
            .user_bans
            .lock()
            .await
            .get(&key)
            .filter(|ban| ban.is_active(now))
            .cloned())
    }

    async fn find_active_ip_ban(
        &self,
        ip: &str,
        now: Timestamp,
    ) -> Result<Option<IpBan>, RepositoryError> {
        Ok(self
            .ip_bans
            .lock()
            .await
            .get(ip)
            .filter(|ban| ban.is_active(now))
            .cloned())
    }

    async fn upsert_user_ban(&self, ban: UserBan) -> Result<(), RepositoryError> {
        let key = (ban.room.as_str().to_owned(), ban.user_id.as_str().to_owned());
        self.user_bans.lock().await.insert(key, ban);
        Ok(())
    }

    async fn upsert_ip_ban(&self, ban: IpBan) -> Result<(), RepositoryError> {
        self.ip_bans.lock().await.insert(ban.ip.clone(), ban);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStrikeRepository {
    strikes: Mutex<HashMap<(String, String), u32>>,
}

impl MemoryStrikeRepository {
    pub async fn get(&self, room: &RoomName, user_id: &UserId) -> u32 {
        let key = (room.as_str().to_owned(), user_id.as_str().to_owned());
        self.strikes.lock().await.get(&key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl StrikeRepository for MemoryStrikeRepository {
    async fn increment_and_get(
        &self,
        room: &RoomName,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<StrikeCount, RepositoryError> {
        let key = (room.as_str().to_owned(), user_id.as_str().to_owned());
        // 读改写在同一把锁内完成，与 SQL 的原子 upsert 等价
        let mut strikes = self.strikes.lock().await;
        let total = strikes.entry(key).or_insert(0);
        *total += 1;
        Ok(StrikeCount {
            room: room.clone(),
            user_id: user_id.clone(),
            strikes: *total,
            updated_at: now,
        })
    }
}

#[derive(Default)]
pub struct MemoryReportRepository {
    reports: Mutex<Vec<AbuseReport>>,
}

impl MemoryReportRepository {
    pub async fn all(&self) -> Vec<AbuseReport> {
        self.reports.lock().await.clone()
    }
}

#[async_trait]
impl ReportRepository for MemoryReportRepository {
    async fn append(&self, report: AbuseReport) -> Result<(), RepositoryError> {
        self.reports.lock().await.push(report);
        Ok(())
    }
}

/// 测试辅助：一次性建出全套内存仓库。
pub struct MemoryStores {
    pub rooms: Arc<MemoryRoomRepository>,
    pub messages: Arc<MemoryMessageRepository>,
    pub presence: Arc<MemoryPresenceRepository>,
    pub bans: Arc<MemoryBanRepository>,
    pub strikes: Arc<MemoryStrikeRepository>,
    pub reports: Arc<MemoryReportRepository>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(MemoryRoomRepository::default()),
            messages: Arc::new(MemoryMessageRepository::default()),
            presence: Arc::new(MemoryPresenceRepository::default()),
            bans: Arc::new(MemoryBanRepository::default()),
            strikes: Arc::new(MemoryStrikeRepository::default()),
            reports: Arc::new(MemoryReportRepository::default()),
        }
    }
}

impl Default for MemoryStores {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn strike_increment_returns_scoped_count() {
        let repo = MemoryStrikeRepository::default();
        let room = RoomName::sanitize("genel");
        let other = RoomName::sanitize("sohbet");
        let user = UserId::parse("u1").unwrap();
        let now = Utc::now();

        let first = repo.increment_and_get(&room, &user, now).await.unwrap();
        assert_eq!(
            first,
            StrikeCount {
                room: room.clone(),
                user_id: user.clone(),
                strikes: 1,
                updated_at: now,
            }
        );

        let second = repo.increment_and_get(&room, &user, now).await.unwrap();
        assert_eq!(second.strikes, 2);

        // 另一个房间从零开始计
        let elsewhere = repo.increment_and_get(&other, &user, now).await.unwrap();
        assert_eq!(elsewhere.strikes, 1);
        assert_eq!(repo.get(&room, &user).await, 2);
    }
}

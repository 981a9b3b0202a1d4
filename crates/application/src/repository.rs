//! 持久化端口定义。
//!
//! 六类实体各一个 trait，由 `infrastructure` 提供 Postgres 实现，
//! `memory` 模块提供测试用内存实现。所有调用方对
//! `RepositoryError` 按 fail-open 策略降级，持久化故障
//! 不得阻断实时转发。

use async_trait::async_trait;
use domain::{
    AbuseReport, ChatMessage, IpBan, Presence, RepositoryError, Room, RoomName, StrikeCount,
    Timestamp, UserBan, UserId,
};

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn find(&self, name: &RoomName) -> Result<Option<Room>, RepositoryError>;

    /// 首次加入未知房间名时创建。并发创建时返回已存在的一行，
    /// 令牌策略以先写入者为准。
    async fn find_or_create(&self, room: Room) -> Result<Room, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError>;

    /// 最近 `limit` 条消息，按时间正序返回。
    async fn recent(&self, room: &RoomName, limit: u32) -> Result<Vec<ChatMessage>, RepositoryError>;
}

#[async_trait]
pub trait PresenceRepository: Send + Sync {
    async fn upsert(&self, presence: Presence) -> Result<(), RepositoryError>;

    async fn set_offline(
        &self,
        room: &RoomName,
        user_id: &UserId,
        at: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// 房间全量名单：在线优先，其次 last_seen 倒序，截断到 `limit`。
    async fn list_for_room(
        &self,
        room: &RoomName,
        limit: u32,
    ) -> Result<Vec<Presence>, RepositoryError>;
}

#[async_trait]
pub trait BanRepository: Send + Sync {
    async fn find_active_user_ban(
        &self,
        room: &RoomName,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Option<UserBan>, RepositoryError>;

    async fn find_active_ip_ban(
        &self,
        ip: &str,
        now: Timestamp,
    ) -> Result<Option<IpBan>, RepositoryError>;

    async fn upsert_user_ban(&self, ban: UserBan) -> Result<(), RepositoryError>;

    async fn upsert_ip_ban(&self, ban: IpBan) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait StrikeRepository: Send + Sync {
    /// 原子地把 (房间, 用户) 的违规计数加一并返回累计结果。
    ///
    /// 必须是单条原子读改写：同一用户的两条并发辱骂消息
    /// 不允许读到同一个旧计数。
    async fn increment_and_get(
        &self,
        room: &RoomName,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<StrikeCount, RepositoryError>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn append(&self, report: AbuseReport) -> Result<(), RepositoryError>;
}

//! 无数据库部署用的占位仓库。
//!
//! 未配置 `DATABASE_URL` 时注入此实现：所有操作返回
//! `Unavailable`，会话层据此全程走降级路径（不留历史、
//! 不记违规、不持久化封禁），纯内存转发照常工作。

use application::{
    BanRepository, MessageRepository, PresenceRepository, ReportRepository, RoomRepository,
    StrikeRepository,
};
use async_trait::async_trait;
use domain::{
    AbuseReport, ChatMessage, IpBan, Presence, RepositoryError, Room, RoomName, StrikeCount,
    Timestamp, UserBan, UserId,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

#[async_trait]
impl RoomRepository for UnavailableStore {
    async fn find(&self, _name: &RoomName) -> Result<Option<Room>, RepositoryError> {
        Err(RepositoryError::Unavailable)
    }

    async fn find_or_create(&self, _room: Room) -> Result<Room, RepositoryError> {
        Err(RepositoryError::Unavailable)
    }
}

#[async_trait]
impl MessageRepository for UnavailableStore {
    async fn append(&self, _message: ChatMessage) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable)
    }

    async fn recent(
        &self,
        _room: &RoomName,
        _limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        Err(RepositoryError::Unavailable)
    }
}

#[async_trait]
impl PresenceRepository for UnavailableStore {
    async fn upsert(&self, _presence: Presence) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable)
    }

    async fn set_offline(
        &self,
        _room: &RoomName,
        _user_id: &UserId,
        _at: Timestamp,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable)
    }

    async fn list_for_room(
        &self,
        _room: &RoomName,
        _limit: u32,
    ) -> Result<Vec<Presence>, RepositoryError> {
        Err(RepositoryError::Unavailable)
    }
}

#[async_trait]
impl BanRepository for UnavailableStore {
    async fn find_active_user_ban(
        &self,
        _room: &RoomName,
        _user_id: &UserId,
        _now: Timestamp,
    ) -> Result<Option<UserBan>, RepositoryError> {
        Err(RepositoryError::Unavailable)
    }

    async fn find_active_ip_ban(
        &self,
        _ip: &str,
        _now: Timestamp,
    ) -> Result<Option<IpBan>, RepositoryError> {
        Err(RepositoryError::Unavailable)
    }

    async fn upsert_user_ban(&self, _ban: UserBan) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable)
    }

    async fn upsert_ip_ban(&self, _ban: IpBan) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable)
    }
}

#[async_trait]
impl StrikeRepository for UnavailableStore {
    async fn increment_and_get(
        &self,
        _room: &RoomName,
        _user_id: &UserId,
        _now: Timestamp,
    ) -> Result<StrikeCount, RepositoryError> {
        Err(RepositoryError::Unavailable)
    }
}

#[async_trait]
impl ReportRepository for UnavailableStore {
    async fn append(&self, _report: AbuseReport) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable)
    }
}

use async_trait::async_trait;
use domain::{ConnectionId, RoomName};
use thiserror::Error;

use crate::events::ServerEvent;

/// 发往单个房间的广播负载。
///
/// `exclude` 用于"除发送者外"的转发（目前只有 typing 用到）。
#[derive(Debug, Clone)]
pub struct RoomBroadcast {
    pub room: RoomName,
    pub exclude: Option<ConnectionId>,
    pub event: ServerEvent,
}

impl RoomBroadcast {
    pub fn to_room(room: RoomName, event: ServerEvent) -> Self {
        Self {
            room,
            exclude: None,
            event,
        }
    }

    pub fn to_others(room: RoomName, exclude: ConnectionId, event: ServerEvent) -> Self {
        Self {
            room,
            exclude: Some(exclude),
            event,
        }
    }
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[async_trait]
pub trait RoomBroadcaster: Send + Sync {
    async fn broadcast(&self, payload: RoomBroadcast) -> Result<(), BroadcastError>;
}

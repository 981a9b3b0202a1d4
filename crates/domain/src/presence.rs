use serde::{Deserialize, Serialize};

use crate::value_objects::{DisplayName, RoomName, Timestamp, UserId};

/// 每个 (房间, 用户) 的在线状态。用户首次加入后始终保留一行，
/// 断开只降级为离线并记录 last_seen。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub room: RoomName,
    pub user_id: UserId,
    pub name: DisplayName,
    pub is_online: bool,
    pub last_seen: Timestamp,
}

impl Presence {
    /// 加入时的在线记录。
    pub fn online(room: RoomName, user_id: UserId, name: DisplayName, at: Timestamp) -> Self {
        Self {
            room,
            user_id,
            name,
            is_online: true,
            last_seen: at,
        }
    }
}

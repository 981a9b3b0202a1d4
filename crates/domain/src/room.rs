use serde::{Deserialize, Serialize};

use crate::value_objects::{RoomName, Timestamp, UserId};

/// 聊天房间。首次有人加入未知房间名时创建，
/// 邀请令牌在创建后即为不可变策略。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub name: RoomName,
    /// 空字符串表示开放房间，任何令牌都可加入。
    pub invite_token: String,
    pub owner: UserId,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(
        name: RoomName,
        invite_token: impl Into<String>,
        owner: UserId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            name,
            invite_token: invite_token.into(),
            owner,
            created_at,
        }
    }

    /// 房间是否开放加入（没有设置邀请令牌）。
    pub fn is_open(&self) -> bool {
        self.invite_token.is_empty()
    }

    /// 校验加入时出示的令牌。开放房间接受任意值。
    pub fn accepts_token(&self, presented: &str) -> bool {
        self.is_open() || self.invite_token == presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn room(token: &str) -> Room {
        Room::new(
            RoomName::sanitize("lobby"),
            token,
            UserId::parse("owner").unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn open_room_accepts_any_token() {
        let room = room("");
        assert!(room.accepts_token(""));
        assert!(room.accepts_token("whatever"));
    }

    #[test]
    fn invite_room_requires_exact_match() {
        let room = room("sesame");
        assert!(room.accepts_token("sesame"));
        assert!(!room.accepts_token("SESAME"));
        assert!(!room.accepts_token(""));
    }
}

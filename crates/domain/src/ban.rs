use serde::{Deserialize, Serialize};

use crate::value_objects::{RoomName, Timestamp, UserId};

/// 封禁是否仍然生效。`until` 为 `None` 表示永久封禁。
fn is_active(until: &Option<Timestamp>, now: Timestamp) -> bool {
    match until {
        None => true,
        Some(expiry) => *expiry > now,
    }
}

/// 房间级用户封禁。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBan {
    pub room: RoomName,
    pub user_id: UserId,
    pub reason: String,
    /// `None` = 永久。
    pub until: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl UserBan {
    pub fn permanent(
        room: RoomName,
        user_id: UserId,
        reason: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            room,
            user_id,
            reason: reason.into(),
            until: None,
            created_at,
        }
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        is_active(&self.until, now)
    }
}

/// 全局 IP 封禁（不分房间）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpBan {
    pub ip: String,
    pub reason: String,
    /// `None` = 永久。
    pub until: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl IpBan {
    pub fn permanent(ip: impl Into<String>, reason: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            ip: ip.into(),
            reason: reason.into(),
            until: None,
            created_at,
        }
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        is_active(&self.until, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn permanent_ban_never_expires() {
        let now = Utc::now();
        let ban = IpBan::permanent("10.0.0.1", "test", now);
        assert!(ban.is_active(now + Duration::days(3650)));
    }

    #[test]
    fn timed_ban_expires() {
        let now = Utc::now();
        let mut ban = UserBan::permanent(
            RoomName::sanitize("lobby"),
            UserId::parse("u1").unwrap(),
            "test",
            now,
        );
        ban.until = Some(now + Duration::minutes(10));
        assert!(ban.is_active(now));
        assert!(!ban.is_active(now + Duration::minutes(11)));
    }
}

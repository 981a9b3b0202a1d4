//! 出站协议事件。
//!
//! 服务端推给客户端的所有 JSON 负载，`type` 字段作为判别标签。
//! 时间戳统一用毫秒级 epoch（与原始协议的 `Date.now()` 对齐）。

use domain::{ChatMessage, Presence};
use serde::{Deserialize, Serialize};

/// 在线名单里的一行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceMember {
    pub user_id: String,
    pub name: String,
    pub is_online: bool,
    pub last_seen: i64,
}

impl From<&Presence> for PresenceMember {
    fn from(presence: &Presence) -> Self {
        Self {
            user_id: presence.user_id.to_string(),
            name: presence.name.to_string(),
            is_online: presence.is_online,
            last_seen: presence.last_seen.timestamp_millis(),
        }
    }
}

/// 历史消息里的一行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub user_id: String,
    pub name: String,
    pub text: String,
    pub ts: i64,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            user_id: message.user_id.to_string(),
            name: message.name.to_string(),
            text: message.text.clone(),
            ts: message.sent_at.timestamp_millis(),
        }
    }
}

/// 服务端出站事件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// 连接建立时上报持久化存储可用性。
    DbStatus { ok: bool },
    /// 系统通知（加入/离开）。
    System { text: String, ts: i64 },
    /// 聊天消息。
    Chat {
        user_id: String,
        name: String,
        text: String,
        ts: i64,
    },
    /// 输入状态转发。
    Typing { name: String, is_typing: bool },
    /// 房间全量在线名单快照。
    PresenceFull { members: Vec<PresenceMember> },
    /// 加入时的私发历史消息（按时间正序）。
    History { messages: Vec<WireMessage> },
    /// 拒绝通知，携带可读原因。
    Blocked { reason: String },
}

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 统一的时间戳类型。
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// 消息正文长度上限。
pub const MAX_MESSAGE_LEN: usize = 500;

/// 房间名和昵称的长度上限（与原始协议一致）。
pub const MAX_LABEL_LEN: usize = 24;

/// 用户ID的长度上限。
pub const MAX_USER_ID_LEN: usize = 64;

/// 单个 WebSocket 连接的唯一标识，由服务端生成。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 客户端自带的用户标识。未做认证，只做长度约束。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn parse(value: impl Into<String>) -> Result<Self, crate::errors::DomainError> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(crate::errors::DomainError::invalid_argument(
                "user_id",
                "cannot be empty",
            ));
        }
        if value.len() > MAX_USER_ID_LEN {
            return Err(crate::errors::DomainError::invalid_argument(
                "user_id", "too long",
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 房间名。缺省为 "lobby"，超长部分直接截断（与原始协议一致）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomName(String);

impl RoomName {
    pub fn sanitize(value: impl Into<String>) -> Self {
        let mut value = value.into().trim().to_owned();
        if value.is_empty() {
            value = "lobby".to_owned();
        }
        truncate_chars(&mut value, MAX_LABEL_LEN);
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 显示昵称。缺省为 "Anon"，超长部分直接截断。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn sanitize(value: impl Into<String>) -> Self {
        let mut value = value.into().trim().to_owned();
        if value.is_empty() {
            value = "Anon".to_owned();
        }
        truncate_chars(&mut value, MAX_LABEL_LEN);
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 按字符数截断，避免在多字节边界上切断。
fn truncate_chars(value: &mut String, max_chars: usize) {
    if let Some((idx, _)) = value.char_indices().nth(max_chars) {
        value.truncate(idx);
    }
}

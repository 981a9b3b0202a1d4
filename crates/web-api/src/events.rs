//! 入站协议事件。
//!
//! 客户端发来的 JSON 负载，`type` 字段作为判别标签。
//! 未知字段一律忽略；身份信息只在 `join` 时出现一次，
//! 后续事件的身份以服务端会话索引为准。

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Join {
        #[serde(default)]
        user_id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        room: String,
        #[serde(default)]
        invite_token: String,
        #[serde(default)]
        age_ok: bool,
    },
    Typing {
        #[serde(default)]
        is_typing: bool,
    },
    Chat {
        #[serde(default)]
        text: String,
    },
    Report {
        #[serde(default)]
        target: String,
        #[serde(default)]
        text: String,
    },
}

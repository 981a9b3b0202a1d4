use serde::{Deserialize, Serialize};

use crate::value_objects::{DisplayName, RoomName, Timestamp, UserId, MAX_MESSAGE_LEN};

/// 已通过审核、待持久化/广播的聊天消息。追加写，不修改不删除。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub room: RoomName,
    pub user_id: UserId,
    pub name: DisplayName,
    pub text: String,
    pub sent_at: Timestamp,
}

impl ChatMessage {
    pub fn new(
        room: RoomName,
        user_id: UserId,
        name: DisplayName,
        text: impl Into<String>,
        sent_at: Timestamp,
    ) -> Self {
        Self {
            room,
            user_id,
            name,
            text: text.into(),
            sent_at,
        }
    }
}

/// 入站文本的整形：去首尾空白并截断到 500 字符。
/// 返回 `None` 表示整形后为空，调用方应静默丢弃。
pub fn sanitize_text(raw: &str) -> Option<String> {
    let mut text = raw.trim().to_owned();
    if let Some((idx, _)) = text.char_indices().nth(MAX_MESSAGE_LEN) {
        text.truncate(idx);
    }
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_after_trim_is_dropped() {
        assert_eq!(sanitize_text("   "), None);
        assert_eq!(sanitize_text("\n\t"), None);
    }

    #[test]
    fn text_is_capped_at_limit() {
        let long = "x".repeat(600);
        let text = sanitize_text(&long).unwrap();
        assert_eq!(text.chars().count(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn ordinary_text_passes_through() {
        assert_eq!(sanitize_text(" merhaba "), Some("merhaba".to_owned()));
    }
}

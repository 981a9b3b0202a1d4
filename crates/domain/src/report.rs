use serde::{Deserialize, Serialize};

use crate::value_objects::{RoomName, Timestamp, UserId};

/// 用户提交的举报。纯持久化记录，不触发任何自动处理。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbuseReport {
    pub room: RoomName,
    pub reporter: UserId,
    pub target: UserId,
    pub text: String,
    pub created_at: Timestamp,
}

use serde::{Deserialize, Serialize};

use crate::value_objects::{RoomName, Timestamp, UserId};

/// 每个 (房间, 用户) 的累计违规计数。只增不减，
/// 跨房间互不影响。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeCount {
    pub room: RoomName,
    pub user_id: UserId,
    pub strikes: u32,
    pub updated_at: Timestamp,
}

/// 违规升级阶梯：第1次警告，第2次踢出，第3次起封禁。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeAction {
    Warn,
    Kick,
    Ban,
}

impl StrikeAction {
    pub fn for_total(total: u32) -> Self {
        match total {
            0 | 1 => Self::Warn,
            2 => Self::Kick,
            _ => Self::Ban,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_escalates_in_order() {
        assert_eq!(StrikeAction::for_total(1), StrikeAction::Warn);
        assert_eq!(StrikeAction::for_total(2), StrikeAction::Kick);
        assert_eq!(StrikeAction::for_total(3), StrikeAction::Ban);
        assert_eq!(StrikeAction::for_total(7), StrikeAction::Ban);
    }
}

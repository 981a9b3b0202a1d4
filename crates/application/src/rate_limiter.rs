//! 按连接的最小发送间隔闸门。
//!
//! 容量恰好为 1 的漏桶：距上一条被接受的消息不足 700ms 的
//! 消息直接丢弃，且不刷新时间戳（否则持续刷屏的连接会把
//! 自己永远锁在门外）。被拒绝时不发任何通知。

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use domain::ConnectionId;

/// 缺省最小间隔。
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(700);

pub struct ConnectionRateLimiter {
    min_interval: Duration,
    last_accepted: Mutex<HashMap<ConnectionId, Instant>>,
}

impl ConnectionRateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// 尝试放行一条消息。返回 `false` 表示应静默丢弃。
    pub fn try_acquire(&self, conn_id: ConnectionId) -> bool {
        let now = Instant::now();
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match last.get(&conn_id) {
            Some(previous) if now.duration_since(*previous) < self.min_interval => false,
            _ => {
                last.insert(conn_id, now);
                true
            }
        }
    }

    /// 连接断开时清掉状态，避免表无限增长。
    pub fn forget(&self, conn_id: ConnectionId) {
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        last.remove(&conn_id);
    }
}

impl Default for ConnectionRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

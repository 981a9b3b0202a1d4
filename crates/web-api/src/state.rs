use std::sync::Arc;

use application::{LocalRoomBroadcaster, SessionService};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub broadcaster: Arc<LocalRoomBroadcaster>,
    /// 为 `Some` 时，升级请求必须携带匹配的 `key` 查询参数。
    pub access_key: Option<String>,
}

impl AppState {
    pub fn new(
        sessions: Arc<SessionService>,
        broadcaster: Arc<LocalRoomBroadcaster>,
        access_key: Option<String>,
    ) -> Self {
        Self {
            sessions,
            broadcaster,
            access_key,
        }
    }
}

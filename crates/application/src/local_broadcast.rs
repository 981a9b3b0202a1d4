// 进程内广播器：单个 tokio broadcast 通道，接收端按房间过滤。
use async_trait::async_trait;
use domain::{ConnectionId, RoomName};
use tokio::sync::broadcast;

use crate::broadcaster::{BroadcastError, RoomBroadcast, RoomBroadcaster};

#[derive(Clone)]
pub struct LocalRoomBroadcaster {
    sender: broadcast::Sender<RoomBroadcast>,
}

impl LocalRoomBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 为一个连接订阅某房间的事件流。
    pub fn subscribe(&self, room: RoomName, conn_id: ConnectionId) -> RoomStream {
        RoomStream {
            receiver: self.sender.subscribe(),
            room,
            conn_id,
        }
    }
}

impl Default for LocalRoomBroadcaster {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl RoomBroadcaster for LocalRoomBroadcaster {
    async fn broadcast(&self, payload: RoomBroadcast) -> Result<(), BroadcastError> {
        // 没有任何订阅者不算错误：房间里只有发送者自己时 send 会失败
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }
        self.sender
            .send(payload)
            .map(|_| ())
            .map_err(|err| BroadcastError::failed(err.to_string()))
    }
}

/// 单连接的房间事件流。只放行本房间、且未被排除的事件。
pub struct RoomStream {
    receiver: broadcast::Receiver<RoomBroadcast>,
    room: RoomName,
    conn_id: ConnectionId,
}

impl RoomStream {
    pub async fn recv(&mut self) -> Option<crate::events::ServerEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(broadcast) => {
                    if broadcast.room != self.room {
                        continue;
                    }
                    if broadcast.exclude == Some(self.conn_id) {
                        continue;
                    }
                    return Some(broadcast.event);
                }
                // 落后于通道容量时跳过丢失的事件继续收
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(room = %self.room, skipped, "broadcast receiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ServerEvent;

    fn system(text: &str) -> ServerEvent {
        ServerEvent::System {
            text: text.into(),
            ts: 0,
        }
    }

    #[tokio::test]
    async fn stream_filters_by_room() {
        let broadcaster = LocalRoomBroadcaster::default();
        let lobby = RoomName::sanitize("lobby");
        let other = RoomName::sanitize("other");
        let mut stream = broadcaster.subscribe(lobby.clone(), ConnectionId::new());

        broadcaster
            .broadcast(RoomBroadcast::to_room(other, system("elsewhere")))
            .await
            .unwrap();
        broadcaster
            .broadcast(RoomBroadcast::to_room(lobby, system("here")))
            .await
            .unwrap();

        match stream.recv().await.unwrap() {
            ServerEvent::System { text, .. } => assert_eq!(text, "here"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn stream_honors_exclusion() {
        let broadcaster = LocalRoomBroadcaster::default();
        let lobby = RoomName::sanitize("lobby");
        let me = ConnectionId::new();
        let mut mine = broadcaster.subscribe(lobby.clone(), me);
        let mut theirs = broadcaster.subscribe(lobby.clone(), ConnectionId::new());

        broadcaster
            .broadcast(RoomBroadcast::to_others(lobby.clone(), me, system("typing")))
            .await
            .unwrap();
        broadcaster
            .broadcast(RoomBroadcast::to_room(lobby, system("after")))
            .await
            .unwrap();

        // 被排除的连接跳过第一条，直接收到第二条
        match mine.recv().await.unwrap() {
            ServerEvent::System { text, .. } => assert_eq!(text, "after"),
            other => panic!("unexpected event {other:?}"),
        }
        match theirs.recv().await.unwrap() {
            ServerEvent::System { text, .. } => assert_eq!(text, "typing"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_not_an_error() {
        let broadcaster = LocalRoomBroadcaster::default();
        let result = broadcaster
            .broadcast(RoomBroadcast::to_room(
                RoomName::sanitize("lobby"),
                system("nobody"),
            ))
            .await;
        assert!(result.is_ok());
    }
}

//! WebSocket 连接生命周期。
//!
//! 每个连接一个任务：先走准入检查，随后在同一个 select 循环里
//! 处理客户端入站帧和房间广播出站事件。加入成功后才会订阅
//! 房间事件流，循环退出时统一走断开清理。

use std::ops::ControlFlow;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};

use application::{
    ChatOutcome, ConnectDecision, JoinOutcome, JoinRequest, RoomStream, ServerEvent,
};
use domain::{ConnectionId, RoomName};

use crate::events::ClientEvent;
use crate::state::AppState;

pub struct WsConnection {
    state: AppState,
    ip: String,
}

impl WsConnection {
    pub fn new(state: AppState, ip: String) -> Self {
        Self { state, ip }
    }

    pub async fn run(self, socket: WebSocket) {
        let conn_id = ConnectionId::new();
        let (mut sender, mut incoming) = socket.split();

        match self.state.sessions.connect(&self.ip).await {
            ConnectDecision::Blocked { reason } => {
                let _ = send_event(&mut sender, &ServerEvent::Blocked { reason }).await;
                let _ = sender.close().await;
                return;
            }
            ConnectDecision::Admitted { db_ok } => {
                if send_event(&mut sender, &ServerEvent::DbStatus { ok: db_ok })
                    .await
                    .is_err()
                {
                    return;
                }
            }
        }

        tracing::info!(conn_id = %conn_id, ip = %self.ip, "websocket connection established");

        // 加入成功前为 None，此时广播分支永远挂起
        let mut stream: Option<RoomStream> = None;

        loop {
            tokio::select! {
                event = room_event(&mut stream) => {
                    match event {
                        Some(event) => {
                            if send_event(&mut sender, &event).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                frame = incoming.next() => {
                    match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            let flow = self
                                .handle_text(conn_id, text.as_str(), &mut sender, &mut stream)
                                .await;
                            if flow.is_break() {
                                break;
                            }
                        }
                        Some(Ok(WsMessage::Close(_))) | None => break,
                        // ping/pong 由协议层自动应答，二进制帧忽略
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            tracing::debug!(conn_id = %conn_id, error = %err, "websocket read error");
                            break;
                        }
                    }
                }
            }
        }

        self.state.sessions.disconnect(conn_id).await;
        let _ = sender.close().await;
        tracing::info!(conn_id = %conn_id, "websocket connection closed");
    }

    async fn handle_text(
        &self,
        conn_id: ConnectionId,
        text: &str,
        sender: &mut SplitSink<WebSocket, WsMessage>,
        stream: &mut Option<RoomStream>,
    ) -> ControlFlow<()> {
        let event: ClientEvent = match serde_json::from_str(text) {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!(conn_id = %conn_id, error = %err, "malformed client event ignored");
                return ControlFlow::Continue(());
            }
        };

        match event {
            ClientEvent::Join {
                user_id,
                name,
                room,
                invite_token,
                age_ok,
            } => {
                // 一个连接只加入一次，重复 join 忽略
                if stream.is_some() {
                    return ControlFlow::Continue(());
                }
                let request = JoinRequest {
                    user_id,
                    name,
                    room,
                    invite_token,
                    age_ok,
                };
                // 先订阅再加入，加入流程自身广播的进场通知和
                // 在线名单快照才能送达加入者本人
                let candidate = self
                    .state
                    .broadcaster
                    .subscribe(RoomName::sanitize(request.room.clone()), conn_id);
                match self.state.sessions.join(conn_id, &self.ip, request).await {
                    JoinOutcome::Joined { history, .. } => {
                        *stream = Some(candidate);
                        if !history.is_empty() {
                            let event = ServerEvent::History { messages: history };
                            if send_event(sender, &event).await.is_err() {
                                return ControlFlow::Break(());
                            }
                        }
                    }
                    JoinOutcome::Rejected { reason } => {
                        let _ = send_event(sender, &ServerEvent::Blocked { reason }).await;
                        return ControlFlow::Break(());
                    }
                }
            }
            ClientEvent::Chat { text } => {
                match self.state.sessions.chat(conn_id, &text).await {
                    ChatOutcome::Delivered | ChatOutcome::SilentDrop => {}
                    ChatOutcome::Warned { reason } => {
                        let event = ServerEvent::Blocked { reason };
                        if send_event(sender, &event).await.is_err() {
                            return ControlFlow::Break(());
                        }
                    }
                    ChatOutcome::Kicked { reason } | ChatOutcome::Banned { reason } => {
                        let _ = send_event(sender, &ServerEvent::Blocked { reason }).await;
                        return ControlFlow::Break(());
                    }
                }
            }
            ClientEvent::Typing { is_typing } => {
                self.state.sessions.typing(conn_id, is_typing).await;
            }
            ClientEvent::Report { target, text } => {
                self.state.sessions.report(conn_id, target, text).await;
            }
        }
        ControlFlow::Continue(())
    }
}

/// 房间事件流分支。未订阅时永远挂起，select 只会走入站分支。
async fn room_event(stream: &mut Option<RoomStream>) -> Option<ServerEvent> {
    match stream.as_mut() {
        Some(stream) => stream.recv().await,
        None => std::future::pending().await,
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, WsMessage>,
    event: &ServerEvent,
) -> Result<(), ()> {
    let payload = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(error = %err, "failed to serialize websocket payload");
            return Ok(());
        }
    };
    sender
        .send(WsMessage::Text(payload.into()))
        .await
        .map_err(|_| ())
}

//! 集成测试支撑：内存仓库装配出完整服务，绑定随机端口。

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use application::memory::MemoryStores;
use application::{
    ConnectionRateLimiter, LocalRoomBroadcaster, SessionService, SessionServiceDependencies,
    SystemClock,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use web_api::{router, AppState};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestApp {
    pub addr: SocketAddr,
    pub stores: MemoryStores,
    pub shutdown_tx: oneshot::Sender<()>,
}

impl TestApp {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

pub async fn spawn_app(access_key: Option<&str>, history_limit: Option<u32>) -> TestApp {
    let stores = MemoryStores::new();
    let broadcaster = Arc::new(LocalRoomBroadcaster::default());
    let sessions = Arc::new(SessionService::new(SessionServiceDependencies {
        rooms: stores.rooms.clone(),
        messages: stores.messages.clone(),
        presence: stores.presence.clone(),
        bans: stores.bans.clone(),
        strikes: stores.strikes.clone(),
        reports: stores.reports.clone(),
        broadcaster: broadcaster.clone(),
        clock: Arc::new(SystemClock),
        // 测试里不等真实时钟
        rate_limiter: ConnectionRateLimiter::new(Duration::ZERO),
        history_limit,
    }));
    let state = AppState::new(sessions, broadcaster, access_key.map(str::to_owned));

    let app = router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .ok();
    });

    TestApp {
        addr,
        stores,
        shutdown_tx,
    }
}

pub async fn connect(url: &str) -> WsClient {
    let (ws, _) = connect_async(url).await.expect("ws connect");
    ws
}

pub async fn send_json(ws: &mut WsClient, value: serde_json::Value) {
    ws.send(TungsteniteMessage::Text(value.to_string().into()))
        .await
        .expect("ws send");
}

pub async fn recv_json(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("connection closed")
            .expect("frame error");
        match frame {
            TungsteniteMessage::Text(payload) => {
                return serde_json::from_str(&payload).expect("payload json")
            }
            TungsteniteMessage::Ping(_) | TungsteniteMessage::Pong(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

/// 丢弃其他事件，等到指定 `type` 的事件为止。
pub async fn recv_until(ws: &mut WsClient, event_type: &str) -> serde_json::Value {
    loop {
        let event = recv_json(ws).await;
        if event["type"] == event_type {
            return event;
        }
    }
}

pub async fn expect_closed(ws: &mut WsClient) {
    loop {
        match tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for close")
        {
            None | Some(Ok(TungsteniteMessage::Close(_))) | Some(Err(_)) => return,
            Some(Ok(_)) => continue,
        }
    }
}

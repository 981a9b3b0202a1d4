use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::{error::ApiError, state::AppState, ws_connection::WsConnection};

#[derive(Debug, Deserialize)]
struct WsQuery {
    #[serde(default)]
    key: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(websocket_upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// WebSocket 升级入口。
///
/// 访问密钥在升级之前校验，不匹配直接回 403，连接不会建立。
async fn websocket_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Result<Response, ApiError> {
    if let Some(expected) = &state.access_key {
        if &query.key != expected {
            tracing::warn!(peer = %peer, "websocket upgrade rejected: bad access key");
            return Err(ApiError::forbidden("invalid access key"));
        }
    }

    let ip = client_ip(&headers, peer);
    Ok(ws.on_upgrade(move |socket| WsConnection::new(state, ip).run(socket)))
}

/// 客户端 IP：优先取 `X-Forwarded-For` 的第一跳，
/// 否则退回 TCP 对端地址。
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

//! Web API 层。
//!
//! 提供 Axum 路由，将 WebSocket 连接的生命周期委托给应用层的
//! 会话控制器。

mod error;
mod events;
mod routes;
mod state;
mod ws_connection;

pub use error::ApiError;
pub use events::ClientEvent;
pub use routes::router;
pub use state::AppState;

//! 主应用程序入口
//!
//! 按环境变量装配依赖并启动 WebSocket 中继服务。
//! 未配置 `DATABASE_URL` 时以纯内存降级模式运行：
//! 转发照常，历史、违规计数和封禁持久化全部停用。

use std::{env, net::SocketAddr, sync::Arc};

use application::{
    ConnectionRateLimiter, LocalRoomBroadcaster, SessionService, SessionServiceDependencies,
    SystemClock,
};
use infrastructure::db::repositories::{
    PostgresBanRepository, PostgresMessageRepository, PostgresPresenceRepository,
    PostgresReportRepository, PostgresRoomRepository, PostgresStrikeRepository,
};
use infrastructure::{create_pool, UnavailableStore};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 读取环境变量配置
    let host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_owned());
    let port = env::var("SERVER_PORT").unwrap_or_else(|_| "8080".to_owned());
    let access_key = env::var("ACCESS_KEY").ok().filter(|key| !key.is_empty());
    let history_limit = env::var("HISTORY_LIMIT")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|limit| *limit > 0);

    let broadcaster = Arc::new(LocalRoomBroadcaster::default());
    let clock = Arc::new(SystemClock);

    let dependencies = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            tracing::info!(
                "连接数据库: {}",
                database_url.split('@').next_back().unwrap_or("unknown")
            );
            let pool = create_pool(&database_url, 10).await?;

            // 运行迁移
            sqlx::migrate!("../../migrations").run(&pool).await?;

            SessionServiceDependencies {
                rooms: Arc::new(PostgresRoomRepository::new(pool.clone())),
                messages: Arc::new(PostgresMessageRepository::new(pool.clone())),
                presence: Arc::new(PostgresPresenceRepository::new(pool.clone())),
                bans: Arc::new(PostgresBanRepository::new(pool.clone())),
                strikes: Arc::new(PostgresStrikeRepository::new(pool.clone())),
                reports: Arc::new(PostgresReportRepository::new(pool)),
                broadcaster: broadcaster.clone(),
                clock,
                rate_limiter: ConnectionRateLimiter::default(),
                history_limit,
            }
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL 未配置，以纯内存降级模式运行");
            let store = Arc::new(UnavailableStore);
            SessionServiceDependencies {
                rooms: store.clone(),
                messages: store.clone(),
                presence: store.clone(),
                bans: store.clone(),
                strikes: store.clone(),
                reports: store,
                broadcaster: broadcaster.clone(),
                clock,
                rate_limiter: ConnectionRateLimiter::default(),
                history_limit,
            }
        }
    };

    let sessions = Arc::new(SessionService::new(dependencies));
    let state = AppState::new(sessions, broadcaster, access_key);

    // 启动 Web 服务器
    let app = router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("聊天服务器启动在 http://{addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

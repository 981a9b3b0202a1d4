//! 应用层：会话编排、在线状态发布、限速与房间广播。
//!
//! 领域实体来自 `domain`，持久化实现由 `infrastructure` 注入。

pub mod broadcaster;
pub mod clock;
pub mod events;
pub mod local_broadcast;
pub mod memory;
pub mod rate_limiter;
pub mod repository;
pub mod session;

pub use broadcaster::{BroadcastError, RoomBroadcast, RoomBroadcaster};
pub use clock::{Clock, SystemClock};
pub use events::{PresenceMember, ServerEvent, WireMessage};
pub use local_broadcast::{LocalRoomBroadcaster, RoomStream};
pub use rate_limiter::ConnectionRateLimiter;
pub use repository::{
    BanRepository, MessageRepository, PresenceRepository, ReportRepository, RoomRepository,
    StrikeRepository,
};
pub use session::{
    ChatOutcome, ConnectDecision, JoinOutcome, JoinRequest, SessionService,
    SessionServiceDependencies,
};

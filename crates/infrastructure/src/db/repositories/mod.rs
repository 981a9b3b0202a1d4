//! 各持久化端口的 Postgres 实现。

pub mod ban_repository_impl;
pub mod message_repository_impl;
pub mod presence_repository_impl;
pub mod report_repository_impl;
pub mod room_repository_impl;
pub mod strike_repository_impl;

pub use ban_repository_impl::PostgresBanRepository;
pub use message_repository_impl::PostgresMessageRepository;
pub use presence_repository_impl::PostgresPresenceRepository;
pub use report_repository_impl::PostgresReportRepository;
pub use room_repository_impl::PostgresRoomRepository;
pub use strike_repository_impl::PostgresStrikeRepository;

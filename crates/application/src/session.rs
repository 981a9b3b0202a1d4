//! 会话控制器
//!
//! 编排连接准入、加入、消息、断开四条流程，是整个系统唯一
//! 拥有"连接 → 会话"索引的地方。所有持久化调用都按
//! fail-open 策略处理：存储故障只记日志并跳过对应功能，
//! 绝不阻断实时转发。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use domain::{
    classify, sanitize_text, ChatMessage, ConnectionId, DisplayName, IpBan, Presence, Room,
    RoomName, StrikeAction, Timestamp, UserBan, UserId, Verdict,
};

use crate::broadcaster::{RoomBroadcast, RoomBroadcaster};
use crate::clock::Clock;
use crate::events::{PresenceMember, ServerEvent, WireMessage};
use crate::rate_limiter::ConnectionRateLimiter;
use crate::repository::{
    BanRepository, MessageRepository, PresenceRepository, ReportRepository, RoomRepository,
    StrikeRepository,
};

/// 在线名单快照的行数上限。
const PRESENCE_PAGE: u32 = 100;

/// 封禁原因（固定文案）。
const REASON_ILLEGAL_SALE: &str = "illegal sale attempt";
const REASON_REPEATED_ABUSE: &str = "repeated abuse";

/// 连接准入裁决。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectDecision {
    /// IP 被封禁，发 blocked 后断开。
    Blocked { reason: String },
    /// 放行。`db_ok` 同时作为 `db_status` 事件的内容。
    Admitted { db_ok: bool },
}

/// 加入请求（来自 `join` 事件，未经校验的原始负载）。
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub user_id: String,
    pub name: String,
    pub room: String,
    pub invite_token: String,
    pub age_ok: bool,
}

/// 加入流程的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined {
        room: RoomName,
        history: Vec<WireMessage>,
    },
    /// 发 blocked 通知后断开连接。
    Rejected { reason: String },
}

/// 消息流程的结果，由传输层映射为通知与断连动作。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// 已广播（尽力持久化）。
    Delivered,
    /// 静默丢弃：空消息、限速、或从未加入的连接。
    SilentDrop,
    /// 发 blocked 通知，连接保持。
    Warned { reason: String },
    /// 发 blocked 通知并断开，不记封禁。
    Kicked { reason: String },
    /// 发 blocked 通知并断开，已记永久封禁。
    Banned { reason: String },
}

/// 连接对应的会话。注册后即为该连接身份的唯一事实来源。
#[derive(Debug, Clone)]
struct Session {
    room: RoomName,
    user_id: UserId,
    name: DisplayName,
    ip: String,
}

pub struct SessionServiceDependencies {
    pub rooms: Arc<dyn RoomRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub presence: Arc<dyn PresenceRepository>,
    pub bans: Arc<dyn BanRepository>,
    pub strikes: Arc<dyn StrikeRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub broadcaster: Arc<dyn RoomBroadcaster>,
    pub clock: Arc<dyn Clock>,
    pub rate_limiter: ConnectionRateLimiter,
    /// `None` 表示加入时不下发历史消息（缺省关闭）。
    pub history_limit: Option<u32>,
}

pub struct SessionService {
    deps: SessionServiceDependencies,
    sessions: RwLock<HashMap<ConnectionId, Session>>,
}

impl SessionService {
    pub fn new(deps: SessionServiceDependencies) -> Self {
        Self {
            deps,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// 连接准入：IP 封禁检查。存储故障时放行（fail-open），
    /// 并通过 `db_ok = false` 让客户端知道降级状态。
    pub async fn connect(&self, ip: &str) -> ConnectDecision {
        let now = self.deps.clock.now();
        match self.deps.bans.find_active_ip_ban(ip, now).await {
            Ok(Some(ban)) => {
                tracing::info!(ip, reason = %ban.reason, "connection rejected: ip banned");
                ConnectDecision::Blocked {
                    reason: "banned".to_owned(),
                }
            }
            Ok(None) => ConnectDecision::Admitted { db_ok: true },
            Err(err) => {
                tracing::warn!(ip, error = %err, "ip ban check skipped, store unavailable");
                ConnectDecision::Admitted { db_ok: false }
            }
        }
    }

    /// 加入流程。任何一步失败都以 `Rejected` 短路，
    /// 由传输层发 blocked 通知并断开。
    pub async fn join(
        &self,
        conn_id: ConnectionId,
        ip: &str,
        request: JoinRequest,
    ) -> JoinOutcome {
        if !request.age_ok {
            return JoinOutcome::Rejected {
                reason: "age confirmation required".to_owned(),
            };
        }

        let user_id = match UserId::parse(request.user_id) {
            Ok(user_id) => user_id,
            Err(err) => {
                return JoinOutcome::Rejected {
                    reason: err.to_string(),
                }
            }
        };
        let name = DisplayName::sanitize(request.name);
        let room = RoomName::sanitize(request.room);
        let now = self.deps.clock.now();

        // 用户级封禁检查（房间范围）
        match self
            .deps
            .bans
            .find_active_user_ban(&room, &user_id, now)
            .await
        {
            Ok(Some(ban)) => {
                tracing::info!(room = %room, user_id = %user_id, reason = %ban.reason, "join rejected: user banned");
                return JoinOutcome::Rejected {
                    reason: "banned".to_owned(),
                };
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(room = %room, user_id = %user_id, error = %err, "user ban check skipped, store unavailable");
            }
        }

        // 房间查找/首次创建；非空令牌要求精确匹配
        match self.deps.rooms.find(&room).await {
            Ok(Some(stored)) => {
                if !stored.accepts_token(&request.invite_token) {
                    return JoinOutcome::Rejected {
                        reason: "invalid invite token".to_owned(),
                    };
                }
            }
            Ok(None) => {
                let candidate = Room::new(
                    room.clone(),
                    request.invite_token.clone(),
                    user_id.clone(),
                    now,
                );
                match self.deps.rooms.find_or_create(candidate).await {
                    // 并发创建时以先写入者的令牌策略为准
                    Ok(stored) => {
                        if !stored.accepts_token(&request.invite_token) {
                            return JoinOutcome::Rejected {
                                reason: "invalid invite token".to_owned(),
                            };
                        }
                    }
                    Err(err) => {
                        tracing::warn!(room = %room, error = %err, "room create skipped, store unavailable");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(room = %room, error = %err, "invite check skipped, store unavailable");
            }
        }

        // 在线状态 upsert（尽力而为）
        let presence = Presence::online(room.clone(), user_id.clone(), name.clone(), now);
        if let Err(err) = self.deps.presence.upsert(presence).await {
            tracing::warn!(room = %room, user_id = %user_id, error = %err, "presence upsert failed");
        }

        // 注册会话索引
        self.sessions.write().await.insert(
            conn_id,
            Session {
                room: room.clone(),
                user_id: user_id.clone(),
                name: name.clone(),
                ip: ip.to_owned(),
            },
        );

        // 历史消息（策略开关，缺省关闭；私发给加入者）
        let mut history = Vec::new();
        if let Some(limit) = self.deps.history_limit {
            match self.deps.messages.recent(&room, limit).await {
                Ok(messages) => {
                    history = messages.iter().map(WireMessage::from).collect();
                }
                Err(err) => {
                    tracing::warn!(room = %room, error = %err, "history fetch skipped, store unavailable");
                }
            }
        }

        tracing::info!(room = %room, user_id = %user_id, conn_id = %conn_id, "user joined");

        self.broadcast(RoomBroadcast::to_room(
            room.clone(),
            ServerEvent::System {
                text: format!("{name} katıldı."),
                ts: now.timestamp_millis(),
            },
        ))
        .await;
        self.publish_presence(&room).await;

        JoinOutcome::Joined { room, history }
    }

    /// 消息流程：整形 → 限速 → 分类 → 升级阶梯或广播。
    pub async fn chat(&self, conn_id: ConnectionId, text: &str) -> ChatOutcome {
        let session = match self.sessions.read().await.get(&conn_id) {
            Some(session) => session.clone(),
            // 未加入的连接发来的消息直接忽略
            None => return ChatOutcome::SilentDrop,
        };

        let text = match sanitize_text(text) {
            Some(text) => text,
            None => return ChatOutcome::SilentDrop,
        };

        if !self.deps.rate_limiter.try_acquire(conn_id) {
            return ChatOutcome::SilentDrop;
        }

        let now = self.deps.clock.now();
        match classify(&text) {
            Verdict::IllegalSale => {
                // 立即永久封禁，不走违规计数
                tracing::info!(room = %session.room, user_id = %session.user_id, "illegal sale detected, banning");
                self.ban_permanently(&session, REASON_ILLEGAL_SALE, now).await;
                ChatOutcome::Banned {
                    reason: "banned".to_owned(),
                }
            }
            Verdict::Abusive(flags) => {
                tracing::info!(
                    room = %session.room,
                    user_id = %session.user_id,
                    profanity = flags.profanity,
                    harassment = flags.harassment,
                    hate = flags.hate,
                    "abusive message"
                );
                let total = match self
                    .deps
                    .strikes
                    .increment_and_get(&session.room, &session.user_id, now)
                    .await
                {
                    Ok(count) => count.strikes,
                    Err(err) => {
                        // 没有持久化就没有升级阶梯，只能丢弃消息
                        tracing::warn!(room = %session.room, user_id = %session.user_id, error = %err, "strike tracking skipped, store unavailable");
                        return ChatOutcome::Warned {
                            reason: "message blocked".to_owned(),
                        };
                    }
                };
                match StrikeAction::for_total(total) {
                    StrikeAction::Warn => ChatOutcome::Warned {
                        reason: format!("message blocked ({total}/3)"),
                    },
                    StrikeAction::Kick => ChatOutcome::Kicked {
                        reason: format!("kicked ({total}/3)"),
                    },
                    StrikeAction::Ban => {
                        self.ban_permanently(&session, REASON_REPEATED_ABUSE, now).await;
                        ChatOutcome::Banned {
                            reason: "banned".to_owned(),
                        }
                    }
                }
            }
            Verdict::Clean => {
                let message = ChatMessage::new(
                    session.room.clone(),
                    session.user_id.clone(),
                    session.name.clone(),
                    text,
                    now,
                );
                // 持久化失败不阻断广播
                if let Err(err) = self.deps.messages.append(message.clone()).await {
                    tracing::warn!(room = %session.room, error = %err, "message persistence failed");
                }
                self.broadcast(RoomBroadcast::to_room(
                    session.room.clone(),
                    ServerEvent::Chat {
                        user_id: message.user_id.to_string(),
                        name: message.name.to_string(),
                        text: message.text,
                        ts: now.timestamp_millis(),
                    },
                ))
                .await;
                ChatOutcome::Delivered
            }
        }
    }

    /// 输入状态：纯转发给房间内其他人，不持久化不审核。
    pub async fn typing(&self, conn_id: ConnectionId, is_typing: bool) {
        let session = match self.sessions.read().await.get(&conn_id) {
            Some(session) => session.clone(),
            None => return,
        };
        self.broadcast(RoomBroadcast::to_others(
            session.room,
            conn_id,
            ServerEvent::Typing {
                name: session.name.to_string(),
                is_typing,
            },
        ))
        .await;
    }

    /// 举报：纯持久化落盘，不触发任何审核动作。
    pub async fn report(&self, conn_id: ConnectionId, target: String, text: String) {
        let session = match self.sessions.read().await.get(&conn_id) {
            Some(session) => session.clone(),
            None => return,
        };
        let target = match UserId::parse(target) {
            Ok(target) => target,
            Err(err) => {
                tracing::warn!(room = %session.room, error = %err, "report dropped: invalid target");
                return;
            }
        };
        let report = domain::AbuseReport {
            room: session.room.clone(),
            reporter: session.user_id,
            target,
            text,
            created_at: self.deps.clock.now(),
        };
        if let Err(err) = self.deps.reports.append(report).await {
            tracing::warn!(room = %session.room, error = %err, "report persistence failed");
        }
    }

    /// 断开流程。从未加入的连接是 no-op。
    pub async fn disconnect(&self, conn_id: ConnectionId) {
        self.deps.rate_limiter.forget(conn_id);
        let session = match self.sessions.write().await.remove(&conn_id) {
            Some(session) => session,
            None => return,
        };
        let now = self.deps.clock.now();

        if let Err(err) = self
            .deps
            .presence
            .set_offline(&session.room, &session.user_id, now)
            .await
        {
            tracing::warn!(room = %session.room, user_id = %session.user_id, error = %err, "presence downgrade failed");
        }

        tracing::info!(room = %session.room, user_id = %session.user_id, conn_id = %conn_id, "user disconnected");

        self.publish_presence(&session.room).await;
        self.broadcast(RoomBroadcast::to_room(
            session.room,
            ServerEvent::System {
                text: format!("{} ayrıldı.", session.name),
                ts: now.timestamp_millis(),
            },
        ))
        .await;
    }

    /// 全量在线名单快照广播：在线优先、last_seen 倒序、截断分页。
    async fn publish_presence(&self, room: &RoomName) {
        let rows = match self.deps.presence.list_for_room(room, PRESENCE_PAGE).await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(room = %room, error = %err, "presence snapshot skipped, store unavailable");
                return;
            }
        };
        let members: Vec<PresenceMember> = rows.iter().map(PresenceMember::from).collect();
        self.broadcast(RoomBroadcast::to_room(
            room.clone(),
            ServerEvent::PresenceFull { members },
        ))
        .await;
    }

    /// 永久封禁：用户级 + IP 级，均为尽力写入。
    async fn ban_permanently(&self, session: &Session, reason: &str, now: Timestamp) {
        let user_ban = UserBan::permanent(
            session.room.clone(),
            session.user_id.clone(),
            reason,
            now,
        );
        if let Err(err) = self.deps.bans.upsert_user_ban(user_ban).await {
            tracing::warn!(room = %session.room, user_id = %session.user_id, error = %err, "user ban persistence failed");
        }
        let ip_ban = IpBan::permanent(session.ip.clone(), reason, now);
        if let Err(err) = self.deps.bans.upsert_ip_ban(ip_ban).await {
            tracing::warn!(ip = %session.ip, error = %err, "ip ban persistence failed");
        }
    }

    async fn broadcast(&self, payload: RoomBroadcast) {
        if let Err(err) = self.deps.broadcaster.broadcast(payload).await {
            tracing::warn!(error = %err, "room broadcast failed");
        }
    }
}

//! 聊天中继系统核心领域模型
//!
//! 包含房间、消息、在线状态、封禁记录等核心实体，
//! 以及纯函数实现的内容审核分类器。

pub mod ban;
pub mod errors;
pub mod message;
pub mod moderation;
pub mod presence;
pub mod report;
pub mod room;
pub mod strike;
pub mod value_objects;

// 重新导出常用类型
pub use ban::*;
pub use errors::*;
pub use message::*;
pub use moderation::{classify, AbuseFlags, Verdict};
pub use presence::*;
pub use report::*;
pub use room::*;
pub use strike::*;
pub use value_objects::*;

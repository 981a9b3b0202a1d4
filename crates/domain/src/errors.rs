//! 领域层错误定义

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 持久化层错误。
///
/// `Unavailable` 表示存储完全不可用；调用方按各自的降级策略
/// 处理（fail-open），绝不因此阻断实时转发。
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("store unavailable")]
    Unavailable,
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(String),
}

impl RepositoryError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type RepositoryResult<T> = Result<T, RepositoryError>;

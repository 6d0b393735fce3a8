//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::commands::ExitStatus;
use crate::application::ports::RunError;
use crate::domain::DomainError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 未收集到可简化的片段（运行前失败，不可重试）
    #[error("No eligible text segments found")]
    CollectionEmpty,

    /// 会话已有活跃运行
    #[error("A simplification run is already active for session: {0}")]
    AlreadyRunning(String),

    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 运行前失败对应的退出状态
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self {
            Self::CollectionEmpty => Some(ExitStatus::NoContent),
            Self::AlreadyRunning(_) => Some(ExitStatus::AlreadyRunning),
            _ => None,
        }
    }
}

impl From<RunError> for ApplicationError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::AlreadyRunning(session_id) => Self::AlreadyRunning(session_id),
            RunError::NotActive(session_id) => Self::not_found("Run", session_id),
        }
    }
}

impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

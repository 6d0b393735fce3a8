//! Simplifier Port - 远程文本简化服务抽象
//!
//! 远程服务被视为不透明的批量调用：
//! simplify(texts[], target_lang, level) -> 与 texts 按下标对应的结果列表

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{BatchEntry, EntryFailure, Level, TargetLang};

/// 整批调用失败
#[derive(Debug, Clone, Error)]
pub enum SimplifyError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error ({status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Cancelled")]
    Cancelled,
}

impl From<&SimplifyError> for EntryFailure {
    fn from(err: &SimplifyError) -> Self {
        match err {
            SimplifyError::NetworkError(msg) => EntryFailure::Network(msg.clone()),
            SimplifyError::Timeout => EntryFailure::Timeout,
            SimplifyError::ServiceError { .. } => EntryFailure::Service(err.to_string()),
            SimplifyError::InvalidResponse(msg) => EntryFailure::InvalidResponse(msg.clone()),
            SimplifyError::Cancelled => EntryFailure::Cancelled,
        }
    }
}

/// 批量简化请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// 待简化文本（1..=MAX_BATCH_SIZE 条）
    pub texts: Vec<String>,
    pub target_lang: TargetLang,
    pub level: Level,
}

impl BatchRequest {
    pub fn new(texts: Vec<String>, target_lang: TargetLang, level: Level) -> Self {
        Self {
            texts,
            target_lang,
            level,
        }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Simplifier Port
///
/// 实现必须保证：返回 Ok 时结果数量与 request.texts 相同且顺序一致；
/// 单条文本的失败以 BatchEntry::Failed 表示，不影响同批其它条目。
#[async_trait]
pub trait SimplifierPort: Send + Sync {
    /// 批量简化
    async fn simplify_batch(&self, request: &BatchRequest) -> Result<Vec<BatchEntry>, SimplifyError>;

    /// 检查简化服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_to_entry_failure() {
        assert_eq!(
            EntryFailure::from(&SimplifyError::Timeout),
            EntryFailure::Timeout
        );
        assert_eq!(
            EntryFailure::from(&SimplifyError::Cancelled),
            EntryFailure::Cancelled
        );
        let service = SimplifyError::ServiceError {
            status: 429,
            message: "Rate limit exceeded".into(),
        };
        assert_eq!(
            EntryFailure::from(&service),
            EntryFailure::Service("Service error (429): Rate limit exceeded".into())
        );
    }
}

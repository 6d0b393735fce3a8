//! Simplification Cache Port - 简化结果缓存
//!
//! 定义简化结果缓存的抽象接口，具体实现使用 Sled (LRU 缓存)

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Level, TargetLang};

/// Simplification Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache full, eviction failed")]
    EvictionFailed,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Simplification Cache Port
///
/// 基于原文内容 + 目标语言 + 等级的 LRU 缓存
/// - 缓存 key: md5(text):lang:level
/// - 只缓存成功的结果
#[async_trait]
pub trait SimplificationCachePort: Send + Sync {
    /// 存储简化结果
    ///
    /// 自动执行 LRU 淘汰以保持缓存大小在限制内
    async fn put(&self, cache_key: &str, simplified: &str) -> Result<(), CacheError>;

    /// 获取简化结果
    ///
    /// 同时更新 last_accessed 时间戳（LRU touch）
    async fn get(&self, cache_key: &str) -> Result<Option<String>, CacheError>;

    async fn remove(&self, cache_key: &str) -> Result<(), CacheError>;

    /// 获取缓存统计信息
    async fn stats(&self) -> CacheStats;
}

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub max_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// 生成缓存 key
pub fn generate_cache_key(text: &str, target_lang: TargetLang, level: Level) -> String {
    let digest = md5::compute(text.as_bytes());
    format!("{:x}:{}:{}", digest, target_lang.as_str(), level.as_str())
}

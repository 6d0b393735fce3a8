//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::dispatcher::DEFAULT_MAX_BATCH_SIZE;
use crate::application::{DispatcherConfig, PipelineSettings};
use crate::domain::{
    ChunkLimits, EligibilityPolicy, Level, TargetLang, DEFAULT_MAX_CHUNK_LENGTH,
    DEFAULT_MIN_SEGMENT_LENGTH, DEFAULT_TARGET_CHUNK_LENGTH,
};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 远程简化服务配置
    #[serde(default)]
    pub simplifier: SimplifierConfig,

    /// 分段与批量参数
    #[serde(default)]
    pub batching: BatchingConfig,

    /// 结果缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 运行状态保留配置
    #[serde(default)]
    pub runs: RunsConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 请求体大小上限（字节）
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024 // 10 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 远程简化服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct SimplifierConfig {
    /// 简化服务基础 URL
    #[serde(default = "default_simplifier_url")]
    pub url: String,

    /// 单批次超时时间（秒）
    #[serde(default = "default_simplifier_timeout")]
    pub timeout_secs: u64,

    /// 默认目标语言：de | en
    #[serde(default = "default_target_lang")]
    pub target_lang: String,

    /// 默认简化等级：very_easy | easy | medium
    #[serde(default = "default_level")]
    pub level: String,

    /// 使用本地 Fake 客户端（开发用，不访问远程服务）
    #[serde(default)]
    pub fake: bool,
}

fn default_simplifier_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_simplifier_timeout() -> u64 {
    60
}

fn default_target_lang() -> String {
    "de".to_string()
}

fn default_level() -> String {
    "easy".to_string()
}

impl Default for SimplifierConfig {
    fn default() -> Self {
        Self {
            url: default_simplifier_url(),
            timeout_secs: default_simplifier_timeout(),
            target_lang: default_target_lang(),
            level: default_level(),
            fake: false,
        }
    }
}

impl SimplifierConfig {
    pub fn target_lang(&self) -> Option<TargetLang> {
        TargetLang::from_str(&self.target_lang)
    }

    pub fn level(&self) -> Option<Level> {
        Level::from_str(&self.level)
    }
}

/// 分段与批量参数
#[derive(Debug, Clone, Deserialize)]
pub struct BatchingConfig {
    /// 最小片段字符数
    #[serde(default = "default_min_segment_length")]
    pub min_segment_length: usize,

    /// 合并块目标长度
    #[serde(default = "default_target_chunk_length")]
    pub target_chunk_length: usize,

    /// 单个文本长度上限（远程服务限制）
    #[serde(default = "default_max_chunk_length")]
    pub max_chunk_length: usize,

    /// 单批次文本数上限（远程服务限制）
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_min_segment_length() -> usize {
    DEFAULT_MIN_SEGMENT_LENGTH
}

fn default_target_chunk_length() -> usize {
    DEFAULT_TARGET_CHUNK_LENGTH
}

fn default_max_chunk_length() -> usize {
    DEFAULT_MAX_CHUNK_LENGTH
}

fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            min_segment_length: default_min_segment_length(),
            target_chunk_length: default_target_chunk_length(),
            max_chunk_length: default_max_chunk_length(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl AppConfig {
    /// 管线参数（批次超时取自 simplifier.timeout_secs）
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            eligibility: EligibilityPolicy::new(self.batching.min_segment_length),
            limits: ChunkLimits::new(
                self.batching.target_chunk_length,
                self.batching.max_chunk_length,
            ),
            dispatcher: DispatcherConfig {
                max_batch_size: self.batching.max_batch_size,
                batch_timeout: Duration::from_secs(self.simplifier.timeout_secs),
                max_chunk_length: self.batching.max_chunk_length,
            },
        }
    }
}

/// 结果缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 是否启用结果缓存
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Sled 数据库路径
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// 最大缓存大小（字节）
    #[serde(default = "default_cache_max_size")]
    pub max_size_bytes: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/simplify-cache.sled")
}

fn default_cache_max_size() -> u64 {
    256 * 1024 * 1024 // 256 MB
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            path: default_cache_path(),
            max_size_bytes: default_cache_max_size(),
        }
    }
}

/// 运行状态保留配置
#[derive(Debug, Clone, Deserialize)]
pub struct RunsConfig {
    /// 已结束运行保留供状态查询的时长（秒）
    #[serde(default = "default_run_retention")]
    pub retention_secs: u64,
}

fn default_run_retention() -> u64 {
    600
}

impl Default for RunsConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_run_retention(),
        }
    }
}

impl RunsConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

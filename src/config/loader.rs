//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 远程服务单批次最多接受的文本数
const REMOTE_MAX_BATCH_SIZE: usize = 10;

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `KLARTEXT_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `KLARTEXT_SERVER__PORT=8080`
/// - `KLARTEXT_SIMPLIFIER__URL=http://simplify-api:8000`
/// - `KLARTEXT_SIMPLIFIER__LEVEL=very_easy`
/// - `KLARTEXT_BATCHING__TARGET_CHUNK_LENGTH=1200`
/// - `KLARTEXT_CACHE__ENABLED=false`
/// - `KLARTEXT_RUNS__RETENTION_SECS=300`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::default();
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", defaults.server.host.as_str())?
        .set_default("server.port", defaults.server.port)?
        .set_default("server.max_body_bytes", defaults.server.max_body_bytes as u64)?
        .set_default("simplifier.url", defaults.simplifier.url.as_str())?
        .set_default("simplifier.timeout_secs", defaults.simplifier.timeout_secs)?
        .set_default("simplifier.target_lang", defaults.simplifier.target_lang.as_str())?
        .set_default("simplifier.level", defaults.simplifier.level.as_str())?
        .set_default("simplifier.fake", defaults.simplifier.fake)?
        .set_default(
            "batching.min_segment_length",
            defaults.batching.min_segment_length as u64,
        )?
        .set_default(
            "batching.target_chunk_length",
            defaults.batching.target_chunk_length as u64,
        )?
        .set_default(
            "batching.max_chunk_length",
            defaults.batching.max_chunk_length as u64,
        )?
        .set_default("batching.max_batch_size", defaults.batching.max_batch_size as u64)?
        .set_default("cache.enabled", defaults.cache.enabled)?
        .set_default("cache.path", defaults.cache.path.to_string_lossy().to_string())?
        .set_default("cache.max_size_bytes", defaults.cache.max_size_bytes)?
        .set_default("runs.retention_secs", defaults.runs.retention_secs)?
        .set_default("log.level", defaults.log.level.as_str())?
        .set_default("log.json", defaults.log.json)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("KLARTEXT")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return invalid("Server port cannot be 0");
    }

    if !config.simplifier.fake && config.simplifier.url.is_empty() {
        return invalid("Simplifier URL cannot be empty");
    }
    if config.simplifier.timeout_secs == 0 {
        return invalid("Simplifier timeout cannot be 0");
    }
    if config.simplifier.target_lang().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "Unsupported target language: {}",
            config.simplifier.target_lang
        )));
    }
    if config.simplifier.level().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "Unsupported simplification level: {}",
            config.simplifier.level
        )));
    }

    let batching = &config.batching;
    if batching.min_segment_length == 0 {
        return invalid("Minimum segment length cannot be 0");
    }
    if batching.max_chunk_length == 0 || batching.target_chunk_length == 0 {
        return invalid("Chunk lengths cannot be 0");
    }
    if batching.target_chunk_length > batching.max_chunk_length {
        return invalid("Target chunk length cannot exceed max chunk length");
    }
    if batching.max_batch_size == 0 || batching.max_batch_size > REMOTE_MAX_BATCH_SIZE {
        return Err(ConfigError::ValidationError(format!(
            "Max batch size must be between 1 and {}",
            REMOTE_MAX_BATCH_SIZE
        )));
    }

    if config.cache.enabled && config.cache.path.as_os_str().is_empty() {
        return invalid("Cache path cannot be empty when cache is enabled");
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    if config.simplifier.fake {
        tracing::info!("Simplifier: fake (local transform)");
    } else {
        tracing::info!("Simplifier URL: {}", config.simplifier.url);
    }
    tracing::info!("Batch Timeout: {}s", config.simplifier.timeout_secs);
    tracing::info!(
        "Defaults: target_lang={}, level={}",
        config.simplifier.target_lang,
        config.simplifier.level
    );
    tracing::info!(
        "Batching: min_segment={}, target_chunk={}, max_chunk={}, max_batch={}",
        config.batching.min_segment_length,
        config.batching.target_chunk_length,
        config.batching.max_chunk_length,
        config.batching.max_batch_size
    );
    tracing::info!("Cache Enabled: {}", config.cache.enabled);
    if config.cache.enabled {
        tracing::info!("Cache Path: {:?}", config.cache.path);
    }
    tracing::info!("Run Retention: {}s", config.runs.retention_secs);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

//! KlarText - 网页文本简化服务
//!
//! 启动流程：加载配置 → 初始化日志 → 组装适配器 → 启动 HTTP 服务

use std::sync::Arc;

use klartext::application::{SimplificationCachePort, SimplifierPort};
use klartext::config::{load_config, print_config, AppConfig};
use klartext::infrastructure::adapters::{
    CachingSimplifier, FakeSimplifierClient, FakeTransform, HttpSimplifierClient,
    HttpSimplifierClientConfig,
};
use klartext::infrastructure::events::EventPublisher;
use klartext::infrastructure::http::{AppState, HttpServer, ServerConfig, SimplifyDefaults};
use klartext::infrastructure::memory::InMemoryRunRegistry;
use klartext::infrastructure::persistence::sled::SledSimplificationCache;

/// 传输层超时在单批超时之外的余量（秒）
const TRANSPORT_TIMEOUT_MARGIN_SECS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("KlarText - 网页文本简化服务");
    print_config(&config);

    let simplifier = build_simplifier(&config).await?;
    if !simplifier.health_check().await {
        tracing::warn!(url = %config.simplifier.url, "Simplifier health check failed, continuing");
    }

    let defaults = SimplifyDefaults {
        target_lang: config.simplifier.target_lang().unwrap_or_default(),
        level: config.simplifier.level().unwrap_or_default(),
    };

    let state = AppState::new(
        InMemoryRunRegistry::with_retention(config.runs.retention()).arc(),
        simplifier,
        EventPublisher::new().arc(),
        config.pipeline_settings(),
        defaults,
    );

    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_body_bytes(config.server.max_body_bytes);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},klartext={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 组装简化服务：HTTP 或 Fake 客户端，可选 sled 结果缓存
async fn build_simplifier(config: &AppConfig) -> anyhow::Result<Arc<dyn SimplifierPort>> {
    let client: Arc<dyn SimplifierPort> = if config.simplifier.fake {
        tracing::warn!("Using FakeSimplifierClient, texts are returned unchanged");
        Arc::new(FakeSimplifierClient::new(FakeTransform::Identity))
    } else {
        let client_config = HttpSimplifierClientConfig::new(&config.simplifier.url)
            .with_timeout(config.simplifier.timeout_secs + TRANSPORT_TIMEOUT_MARGIN_SECS);
        Arc::new(HttpSimplifierClient::new(client_config)?)
    };

    if !config.cache.enabled {
        return Ok(client);
    }

    if let Some(parent) = config.cache.path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let cache = SledSimplificationCache::open(&config.cache.path, config.cache.max_size_bytes)?;

    let stats = cache.stats().await;
    tracing::info!(
        entries = stats.total_entries,
        size_bytes = stats.total_size_bytes,
        max_size_bytes = stats.max_size_bytes,
        "Simplification cache ready"
    );

    Ok(Arc::new(CachingSimplifier::new(client, cache.arc())))
}

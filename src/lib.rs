//! KlarText - 网页文本简化
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Document: 内容树与可简化判定
//! - Text: Segment、合并块与批量结果
//! - Collector / Chunk Optimizer / Reconciler: 纯同步的分段、合并与回填
//!
//! 应用层 (application/):
//! - Ports: SimplifierPort, RunRegistryPort, ProgressReporterPort, SimplificationCachePort
//! - Dispatcher: 批量请求编排（取消、超时、进度）
//! - Commands / Queries: 运行、取消与状态查询
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTML 文档解析, 简化服务客户端
//! - Memory: RunRegistry 内存实现
//! - Persistence: Sled 结果缓存
//! - Events: WebSocket 事件发布
//! - HTTP: RESTful API + WebSocket

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};

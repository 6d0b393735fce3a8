//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Simplifier、RunRegistry、ProgressReporter、Cache）
//! - dispatcher: 批次切分、顺序调用、超时与取消
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod dispatcher;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    CancelRunCommand,
    CancelRunResponse,
    ExitStatus,
    FailureInfo,
    RunSimplificationCommand,
    RunSummary,
    // Handlers
    handlers::{CancelRunHandler, PipelineSettings, RunSimplificationHandler},
};

pub use dispatcher::{BatchDispatcher, DispatchOutcome, DispatchParams, DispatcherConfig};

pub use error::ApplicationError;

pub use ports::{
    // Progress
    NoopReporter,
    ProgressEvent,
    ProgressPhase,
    ProgressReporterPort,
    // Run registry
    RunError,
    RunGuard,
    RunRegistryPort,
    RunSnapshot,
    // Cache
    generate_cache_key,
    CacheError,
    CacheStats,
    SimplificationCachePort,
    // Simplifier
    BatchRequest,
    SimplifierPort,
    SimplifyError,
};

pub use queries::{
    GetRunStatusQuery,
    RunStatusResponse,
    // Handlers
    handlers::GetRunStatusHandler,
};

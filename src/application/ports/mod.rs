//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod progress;
mod run_registry;
mod simplification_cache;
mod simplifier;

pub use progress::{NoopReporter, ProgressEvent, ProgressPhase, ProgressReporterPort};
pub use run_registry::{
    estimate_eta, percent_of, RunError, RunGuard, RunRegistryPort, RunSnapshot,
};
pub use simplification_cache::{
    generate_cache_key, CacheError, CacheStats, SimplificationCachePort,
};
pub use simplifier::{BatchRequest, SimplifierPort, SimplifyError};

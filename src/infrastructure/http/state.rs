//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    CancelRunHandler, GetRunStatusHandler, PipelineSettings, RunRegistryPort,
    RunSimplificationHandler, SimplifierPort,
};
use crate::domain::{Level, TargetLang};
use crate::infrastructure::events::EventPublisher;

/// 请求未指定时使用的简化参数
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplifyDefaults {
    pub target_lang: TargetLang,
    pub level: Level,
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub run_registry: Arc<dyn RunRegistryPort>,
    pub simplifier: Arc<dyn SimplifierPort>,
    pub event_publisher: Arc<EventPublisher>,
    pub defaults: SimplifyDefaults,

    // ========== Command Handlers ==========
    pub run_simplification_handler: RunSimplificationHandler,
    pub cancel_run_handler: CancelRunHandler,

    // ========== Query Handlers ==========
    pub get_run_status_handler: GetRunStatusHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        run_registry: Arc<dyn RunRegistryPort>,
        simplifier: Arc<dyn SimplifierPort>,
        event_publisher: Arc<EventPublisher>,
        settings: PipelineSettings,
        defaults: SimplifyDefaults,
    ) -> Self {
        Self {
            run_registry: run_registry.clone(),
            simplifier: simplifier.clone(),
            event_publisher,
            defaults,

            run_simplification_handler: RunSimplificationHandler::new(
                run_registry.clone(),
                simplifier,
                settings,
            ),
            cancel_run_handler: CancelRunHandler::new(run_registry.clone()),

            get_run_status_handler: GetRunStatusHandler::new(run_registry),
        }
    }
}

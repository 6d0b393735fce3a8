//! Progress Reporter Port - 进度事件输出
//!
//! 只负责转发，不含逻辑。事件在 batch_index 上单调不减；
//! percent 按已完成 Segment 数计算，批次大小不均时不会失真。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 进度阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    /// 运行开始（批次尚未发出）
    RunStarted,
    /// 批次即将发出
    BatchStarted,
    /// 批次已返回（成功或失败）
    BatchCompleted,
    /// 运行结束
    RunFinished,
}

impl ProgressPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressPhase::RunStarted => "run_started",
            ProgressPhase::BatchStarted => "batch_started",
            ProgressPhase::BatchCompleted => "batch_completed",
            ProgressPhase::RunFinished => "run_finished",
        }
    }
}

/// 进度事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub session_id: String,
    pub run_id: Uuid,
    pub phase: ProgressPhase,
    /// 0-100
    pub percent: u8,
    /// 从 1 开始；RunStarted 时为 0
    pub batch_index: usize,
    pub total_batches: usize,
    pub completed_segments: usize,
    pub total_segments: usize,
    pub eta_seconds: Option<f64>,
    pub failed_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Progress Reporter Port
pub trait ProgressReporterPort: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

impl<F> ProgressReporterPort for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// 丢弃所有事件
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporterPort for NoopReporter {
    fn report(&self, _event: &ProgressEvent) {}
}

//! Run Registry Port - 简化运行状态管理
//!
//! 每个会话同一时间最多一个活跃运行（重入保护）。
//! 运行状态通过 RunGuard 持有，Drop 时无条件释放，
//! 正常完成、取消、错误或 panic 展开都会把会话恢复为非活跃。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Run Registry 错误
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Run already active for session: {0}")]
    AlreadyRunning(String),

    #[error("No active run for session: {0}")]
    NotActive(String),
}

/// 运行状态快照
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub session_id: String,
    pub run_id: Uuid,
    pub active: bool,
    pub cancel_requested: bool,
    pub completed_count: usize,
    pub total_count: usize,
    pub total_batches: usize,
    #[serde(serialize_with = "serialize_durations_ms")]
    pub batch_durations: Vec<Duration>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSnapshot {
    pub fn new(session_id: impl Into<String>, run_id: Uuid) -> Self {
        Self {
            session_id: session_id.into(),
            run_id,
            active: true,
            cancel_requested: false,
            completed_count: 0,
            total_count: 0,
            total_batches: 0,
            batch_durations: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// 按已完成 Segment 数计算的百分比
    pub fn percent(&self) -> u8 {
        percent_of(self.completed_count, self.total_count)
    }

    /// 剩余时间估计（秒）
    pub fn eta_seconds(&self) -> Option<f64> {
        let remaining = self
            .total_batches
            .saturating_sub(self.batch_durations.len());
        estimate_eta(&self.batch_durations, remaining)
    }
}

fn serialize_durations_ms<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(Some(durations.len()))?;
    for d in durations {
        seq.serialize_element(&(d.as_millis() as u64))?;
    }
    seq.end()
}

/// 完成百分比（0-100）
pub fn percent_of(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed.min(total) * 100) / total) as u8
}

/// 剩余时间 = 已完成批次平均耗时 × 剩余批次数
///
/// 尚无已完成批次时返回 None
pub fn estimate_eta(durations: &[Duration], remaining_batches: usize) -> Option<f64> {
    if durations.is_empty() {
        return None;
    }
    let total: f64 = durations.iter().map(Duration::as_secs_f64).sum();
    let mean = total / durations.len() as f64;
    Some(mean * remaining_batches as f64)
}

/// Run Registry Port
///
/// 所有带 run_id 的写操作只作用于该 run_id 对应的运行，
/// 过期的 RunGuard 不会影响之后开始的新运行。
pub trait RunRegistryPort: Send + Sync {
    /// 尝试开始运行；会话已有活跃运行时返回 AlreadyRunning 且不修改其状态
    fn try_begin(
        &self,
        session_id: &str,
        run_id: Uuid,
        cancel_token: CancellationToken,
    ) -> Result<(), RunError>;

    /// 设置总 Segment 数与总批次数
    fn set_totals(&self, session_id: &str, run_id: Uuid, total_count: usize, total_batches: usize);

    /// 记录一个批次完成
    fn record_batch(
        &self,
        session_id: &str,
        run_id: Uuid,
        completed_count: usize,
        duration: Duration,
    );

    /// 请求取消活跃运行，返回被取消的 run_id
    fn request_cancel(&self, session_id: &str) -> Result<Uuid, RunError>;

    /// 获取会话最近一次运行的快照
    fn snapshot(&self, session_id: &str) -> Option<RunSnapshot>;

    /// 结束运行（重置为非活跃）
    fn finish(&self, session_id: &str, run_id: Uuid);
}

/// 活跃运行的所有权凭证
///
/// 持有期间会话处于活跃状态；Drop 时调用 finish
pub struct RunGuard {
    registry: Arc<dyn RunRegistryPort>,
    session_id: String,
    run_id: Uuid,
    cancel_token: CancellationToken,
}

impl RunGuard {
    /// 获取运行权
    pub fn acquire(
        registry: Arc<dyn RunRegistryPort>,
        session_id: impl Into<String>,
        cancel_token: CancellationToken,
    ) -> Result<Self, RunError> {
        let session_id = session_id.into();
        let run_id = Uuid::new_v4();
        registry.try_begin(&session_id, run_id, cancel_token.clone())?;

        tracing::debug!(session_id = %session_id, run_id = %run_id, "Run acquired");

        Ok(Self {
            registry,
            session_id,
            run_id,
            cancel_token,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn set_totals(&self, total_count: usize, total_batches: usize) {
        self.registry
            .set_totals(&self.session_id, self.run_id, total_count, total_batches);
    }

    pub fn record_batch(&self, completed_count: usize, duration: Duration) {
        self.registry
            .record_batch(&self.session_id, self.run_id, completed_count, duration);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.registry.finish(&self.session_id, self.run_id);
        tracing::debug!(session_id = %self.session_id, run_id = %self.run_id, "Run released");
    }
}

impl std::fmt::Debug for RunGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunGuard")
            .field("session_id", &self.session_id)
            .field("run_id", &self.run_id)
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(0, 0), 0);
        assert_eq!(percent_of(0, 45), 0);
        assert_eq!(percent_of(22, 45), 48);
        assert_eq!(percent_of(45, 45), 100);
        assert_eq!(percent_of(50, 45), 100);
    }

    #[test]
    fn test_estimate_eta_uses_mean_duration() {
        assert_eq!(estimate_eta(&[], 3), None);

        let durations = [Duration::from_secs(2), Duration::from_secs(4)];
        assert_eq!(estimate_eta(&durations, 2), Some(6.0));
        assert_eq!(estimate_eta(&durations, 0), Some(0.0));
    }
}

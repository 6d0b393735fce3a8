//! In-Memory Run Registry Implementation

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::ports::{RunError, RunRegistryPort, RunSnapshot};

/// 会话运行状态
struct RunState {
    snapshot: RunSnapshot,
    cancel_token: CancellationToken,
}

/// 已结束运行的默认保留时长
pub const DEFAULT_RUN_RETENTION: Duration = Duration::from_secs(600);

/// 内存运行注册表
///
/// session_id -> 最近一次运行；结束后保留为非活跃状态供查询，
/// 超过保留时长的已结束运行在下一次 try_begin 时清除
pub struct InMemoryRunRegistry {
    runs: DashMap<String, RunState>,
    retention: Duration,
}

impl InMemoryRunRegistry {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RUN_RETENTION)
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            runs: DashMap::new(),
            retention,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 清除超过保留时长的已结束运行
    fn evict_finished(&self) {
        let now = Utc::now();
        let before = self.runs.len();

        self.runs.retain(|_, state| {
            if state.snapshot.active {
                return true;
            }
            match state.snapshot.finished_at {
                // 时钟回拨时 to_std 失败，保留条目
                Some(finished_at) => now
                    .signed_duration_since(finished_at)
                    .to_std()
                    .map(|age| age < self.retention)
                    .unwrap_or(true),
                None => true,
            }
        });

        let evicted = before.saturating_sub(self.runs.len());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.runs.len(), "Finished runs evicted");
        }
    }

    /// 对指定 run 的活跃状态执行修改，run_id 不匹配时忽略
    fn with_run(&self, session_id: &str, run_id: Uuid, f: impl FnOnce(&mut RunState)) {
        if let Some(mut state) = self.runs.get_mut(session_id) {
            if state.snapshot.run_id == run_id {
                f(&mut state);
            }
        }
    }
}

impl Default for InMemoryRunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RunRegistryPort for InMemoryRunRegistry {
    fn try_begin(
        &self,
        session_id: &str,
        run_id: Uuid,
        cancel_token: CancellationToken,
    ) -> Result<(), RunError> {
        self.evict_finished();

        let state = RunState {
            snapshot: RunSnapshot::new(session_id, run_id),
            cancel_token,
        };

        // entry 持有分片锁，检查与写入是原子的
        match self.runs.entry(session_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().snapshot.active {
                    return Err(RunError::AlreadyRunning(session_id.to_string()));
                }
                occupied.insert(state);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(state);
            }
        }

        tracing::debug!(session_id = %session_id, run_id = %run_id, "Run registered");
        Ok(())
    }

    fn set_totals(&self, session_id: &str, run_id: Uuid, total_count: usize, total_batches: usize) {
        self.with_run(session_id, run_id, |state| {
            state.snapshot.total_count = total_count;
            state.snapshot.total_batches = total_batches;
        });
    }

    fn record_batch(
        &self,
        session_id: &str,
        run_id: Uuid,
        completed_count: usize,
        duration: Duration,
    ) {
        self.with_run(session_id, run_id, |state| {
            state.snapshot.completed_count = completed_count;
            state.snapshot.batch_durations.push(duration);
        });
    }

    fn request_cancel(&self, session_id: &str) -> Result<Uuid, RunError> {
        match self.runs.get_mut(session_id) {
            Some(mut state) if state.snapshot.active => {
                state.snapshot.cancel_requested = true;
                state.cancel_token.cancel();
                Ok(state.snapshot.run_id)
            }
            _ => Err(RunError::NotActive(session_id.to_string())),
        }
    }

    fn snapshot(&self, session_id: &str) -> Option<RunSnapshot> {
        self.runs.get(session_id).map(|state| state.snapshot.clone())
    }

    fn finish(&self, session_id: &str, run_id: Uuid) {
        self.with_run(session_id, run_id, |state| {
            state.snapshot.active = false;
            state.snapshot.finished_at = Some(Utc::now());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentry_rejected_without_mutation() {
        let registry = InMemoryRunRegistry::new();
        let first = Uuid::new_v4();
        registry
            .try_begin("s1", first, CancellationToken::new())
            .unwrap();
        registry.set_totals("s1", first, 10, 1);

        let err = registry.try_begin("s1", Uuid::new_v4(), CancellationToken::new());
        assert!(matches!(err, Err(RunError::AlreadyRunning(_))));

        let snapshot = registry.snapshot("s1").unwrap();
        assert_eq!(snapshot.run_id, first);
        assert_eq!(snapshot.total_count, 10);
        assert!(snapshot.active);
    }

    #[test]
    fn test_finish_allows_new_run() {
        let registry = InMemoryRunRegistry::new();
        let first = Uuid::new_v4();
        registry
            .try_begin("s1", first, CancellationToken::new())
            .unwrap();
        registry.finish("s1", first);
        assert!(!registry.snapshot("s1").unwrap().active);

        let second = Uuid::new_v4();
        registry
            .try_begin("s1", second, CancellationToken::new())
            .unwrap();
        assert_eq!(registry.snapshot("s1").unwrap().run_id, second);
    }

    #[test]
    fn test_stale_run_id_ignored() {
        let registry = InMemoryRunRegistry::new();
        let old = Uuid::new_v4();
        registry.try_begin("s1", old, CancellationToken::new()).unwrap();
        registry.finish("s1", old);

        let current = Uuid::new_v4();
        registry
            .try_begin("s1", current, CancellationToken::new())
            .unwrap();

        registry.record_batch("s1", old, 99, Duration::from_secs(1));
        registry.finish("s1", old);

        let snapshot = registry.snapshot("s1").unwrap();
        assert!(snapshot.active);
        assert_eq!(snapshot.completed_count, 0);
        assert!(snapshot.batch_durations.is_empty());
    }

    #[test]
    fn test_request_cancel_signals_token() {
        let registry = InMemoryRunRegistry::new();
        assert!(matches!(
            registry.request_cancel("s1"),
            Err(RunError::NotActive(_))
        ));

        let token = CancellationToken::new();
        let run_id = Uuid::new_v4();
        registry.try_begin("s1", run_id, token.clone()).unwrap();

        assert_eq!(registry.request_cancel("s1").unwrap(), run_id);
        assert!(token.is_cancelled());
        assert!(registry.snapshot("s1").unwrap().cancel_requested);

        registry.finish("s1", run_id);
        assert!(registry.request_cancel("s1").is_err());
    }

    #[test]
    fn test_finished_runs_evicted_after_retention() {
        let registry = Arc::new(InMemoryRunRegistry::with_retention(Duration::ZERO));
        for i in 0..1000 {
            let run = crate::application::ports::RunGuard::acquire(
                registry.clone(),
                format!("s{}", i),
                CancellationToken::new(),
            )
            .unwrap();
            drop(run);
        }
        assert_eq!(registry.runs.len(), 1);

        // 活跃运行不受保留时长影响
        let active = Uuid::new_v4();
        registry
            .try_begin("busy", active, CancellationToken::new())
            .unwrap();
        registry
            .try_begin("other", Uuid::new_v4(), CancellationToken::new())
            .unwrap();
        assert!(registry.snapshot("busy").unwrap().active);
        assert!(registry.snapshot("s999").is_none());
    }

    #[test]
    fn test_finished_run_kept_within_retention() {
        let registry = InMemoryRunRegistry::new();
        let run_id = Uuid::new_v4();
        registry.try_begin("s1", run_id, CancellationToken::new()).unwrap();
        registry.finish("s1", run_id);

        registry
            .try_begin("s2", Uuid::new_v4(), CancellationToken::new())
            .unwrap();
        let snapshot = registry.snapshot("s1").unwrap();
        assert_eq!(snapshot.run_id, run_id);
        assert!(!snapshot.active);
    }
}

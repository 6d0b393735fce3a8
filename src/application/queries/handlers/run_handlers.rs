//! Run Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{RunRegistryPort, RunSnapshot};
use crate::application::queries::{GetRunStatusQuery, RunStatusResponse};

impl From<RunSnapshot> for RunStatusResponse {
    fn from(snapshot: RunSnapshot) -> Self {
        Self {
            percent: snapshot.percent(),
            eta_seconds: if snapshot.active {
                snapshot.eta_seconds()
            } else {
                None
            },
            session_id: snapshot.session_id,
            run_id: snapshot.run_id,
            active: snapshot.active,
            cancel_requested: snapshot.cancel_requested,
            completed_count: snapshot.completed_count,
            total_count: snapshot.total_count,
            batches_completed: snapshot.batch_durations.len(),
            total_batches: snapshot.total_batches,
            started_at: snapshot.started_at.to_rfc3339(),
            finished_at: snapshot.finished_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// GetRunStatus Handler - 查询会话最近一次运行
pub struct GetRunStatusHandler {
    registry: Arc<dyn RunRegistryPort>,
}

impl GetRunStatusHandler {
    pub fn new(registry: Arc<dyn RunRegistryPort>) -> Self {
        Self { registry }
    }

    pub fn handle(&self, query: GetRunStatusQuery) -> Result<RunStatusResponse, ApplicationError> {
        self.registry
            .snapshot(&query.session_id)
            .map(RunStatusResponse::from)
            .ok_or_else(|| ApplicationError::not_found("Run", query.session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::RunGuard;
    use crate::infrastructure::memory::InMemoryRunRegistry;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_status_reflects_progress_and_release() {
        let registry = Arc::new(InMemoryRunRegistry::new());
        let handler = GetRunStatusHandler::new(registry.clone());

        assert!(handler
            .handle(GetRunStatusQuery {
                session_id: "s1".into()
            })
            .is_err());

        let run = RunGuard::acquire(registry.clone(), "s1", CancellationToken::new()).unwrap();
        run.set_totals(40, 4);
        run.record_batch(10, Duration::from_secs(2));

        let status = handler
            .handle(GetRunStatusQuery {
                session_id: "s1".into(),
            })
            .unwrap();
        assert!(status.active);
        assert_eq!(status.percent, 25);
        assert_eq!(status.batches_completed, 1);
        assert_eq!(status.eta_seconds, Some(6.0));

        drop(run);

        let status = handler
            .handle(GetRunStatusQuery {
                session_id: "s1".into(),
            })
            .unwrap();
        assert!(!status.active);
        assert!(status.finished_at.is_some());
        assert_eq!(status.eta_seconds, None);
    }
}

//! Simplification Command Handlers
//!
//! 收集 → 合并 → 分发 → 回填

use std::sync::Arc;

use crate::application::commands::simplify_commands::*;
use crate::application::dispatcher::{BatchDispatcher, DispatchParams, DispatcherConfig};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    percent_of, ProgressEvent, ProgressPhase, ProgressReporterPort, RunGuard, RunRegistryPort,
    SimplifierPort,
};
use crate::domain::{collect, optimize, reconcile, ChunkLimits, EligibilityPolicy, SegmentId};

/// 管线参数
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub eligibility: EligibilityPolicy,
    pub limits: ChunkLimits,
    pub dispatcher: DispatcherConfig,
}

/// RunSimplification Handler - 执行一次完整的简化运行
pub struct RunSimplificationHandler {
    registry: Arc<dyn RunRegistryPort>,
    dispatcher: BatchDispatcher,
    eligibility: EligibilityPolicy,
    limits: ChunkLimits,
}

impl RunSimplificationHandler {
    pub fn new(
        registry: Arc<dyn RunRegistryPort>,
        simplifier: Arc<dyn SimplifierPort>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            registry,
            dispatcher: BatchDispatcher::new(settings.dispatcher, simplifier),
            eligibility: settings.eligibility,
            limits: settings.limits,
        }
    }

    /// 执行简化
    ///
    /// 每个成功的片段调用一次 apply；只有 CollectionEmpty 与 AlreadyRunning
    /// 会以错误返回，其余失败都体现在 RunSummary 中。
    pub async fn handle<F>(
        &self,
        cmd: RunSimplificationCommand,
        apply: F,
        reporter: &dyn ProgressReporterPort,
    ) -> Result<RunSummary, ApplicationError>
    where
        F: FnMut(SegmentId, &str) + Send,
    {
        let cancel_token = cmd.cancel_token.clone().unwrap_or_default();

        // 运行权在所有退出路径上由 guard 释放
        let run = RunGuard::acquire(self.registry.clone(), &cmd.session_id, cancel_token)
            .map_err(|e| {
                tracing::warn!(session_id = %cmd.session_id, "Run rejected, already active");
                ApplicationError::from(e)
            })?;

        let segments = collect(&cmd.document, &self.eligibility);
        if segments.is_empty() {
            tracing::info!(session_id = %cmd.session_id, "No eligible segments");
            return Err(ApplicationError::CollectionEmpty);
        }

        let chunks = optimize(&segments, &self.limits);

        tracing::info!(
            session_id = %cmd.session_id,
            run_id = %run.run_id(),
            segments = segments.len(),
            chunks = chunks.len(),
            batches = self.dispatcher.total_batches(chunks.len()),
            target_lang = cmd.target_lang.as_str(),
            level = cmd.level.as_str(),
            "Simplification run started"
        );

        let params = DispatchParams {
            target_lang: cmd.target_lang,
            level: cmd.level,
            domain: cmd.domain.as_deref(),
        };
        let outcome = self.dispatcher.run(&run, &chunks, params, reporter).await;

        let report = reconcile(&chunks, &outcome.entries, apply);

        let status = if outcome.cancelled {
            ExitStatus::Cancelled
        } else if report.failed() > 0 || !report.mismatches.is_empty() {
            ExitStatus::Partial
        } else {
            ExitStatus::Ok
        };

        let failures: Vec<FailureInfo> = report
            .failures
            .iter()
            .map(|f| FailureInfo {
                segment_id: f.segment_id,
                reason: f.reason.to_string(),
                cancelled: f.reason.is_cancelled(),
            })
            .collect();
        let cancelled_count = failures.iter().filter(|f| f.cancelled).count();

        reporter.report(&ProgressEvent {
            session_id: cmd.session_id.clone(),
            run_id: run.run_id(),
            phase: ProgressPhase::RunFinished,
            percent: percent_of(segments.len() - cancelled_count, segments.len()),
            batch_index: outcome.batches_sent,
            total_batches: outcome.total_batches,
            completed_segments: segments.len() - cancelled_count,
            total_segments: segments.len(),
            eta_seconds: None,
            failed_count: report.failed(),
            domain: cmd.domain.clone(),
        });

        tracing::info!(
            session_id = %cmd.session_id,
            run_id = %run.run_id(),
            status = status.as_str(),
            succeeded = report.applied,
            failed = report.failed(),
            mismatches = report.mismatches.len(),
            "Simplification run finished"
        );

        Ok(RunSummary {
            run_id: run.run_id(),
            status,
            succeeded: report.applied,
            failed: report.failed(),
            segment_count: segments.len(),
            chunk_count: chunks.len(),
            batch_count: outcome.batches_sent,
            mismatches: report.mismatches,
            failures,
            segments,
        })
    }
}

/// CancelRun Handler - 请求取消活跃运行
pub struct CancelRunHandler {
    registry: Arc<dyn RunRegistryPort>,
}

impl CancelRunHandler {
    pub fn new(registry: Arc<dyn RunRegistryPort>) -> Self {
        Self { registry }
    }

    pub fn handle(&self, cmd: CancelRunCommand) -> Result<CancelRunResponse, ApplicationError> {
        let run_id = self.registry.request_cancel(&cmd.session_id)?;

        tracing::info!(session_id = %cmd.session_id, run_id = %run_id, "Cancellation requested");

        Ok(CancelRunResponse {
            session_id: cmd.session_id,
            run_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NoopReporter;
    use crate::domain::{DocumentTree, NodeCapabilities};
    use crate::infrastructure::adapters::simplifier::{FakeSimplifierClient, FakeTransform};
    use crate::infrastructure::memory::InMemoryRunRegistry;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    const LONG: usize = 150;
    const SHORT: usize = 40;

    fn text(index: usize, len: usize) -> String {
        let mut s = format!("Absatz {:02} ", index);
        while s.chars().count() < len {
            s.push('a');
        }
        s
    }

    /// 11 × (长 短 短) + 12 × 长 = 45 个片段
    fn document_45() -> DocumentTree {
        let mut tree = DocumentTree::new("body", NodeCapabilities::block());
        let mut index = 0;
        let mut add = |tree: &mut DocumentTree, len: usize| {
            let p = tree
                .append_element(tree.root(), "p", NodeCapabilities::block())
                .unwrap();
            tree.append_text(p, text(index, len)).unwrap();
            index += 1;
        };
        for _ in 0..11 {
            add(&mut tree, LONG);
            add(&mut tree, SHORT);
            add(&mut tree, SHORT);
        }
        for _ in 0..12 {
            add(&mut tree, LONG);
        }
        tree
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            eligibility: EligibilityPolicy::new(20),
            limits: ChunkLimits::new(100, 200),
            dispatcher: DispatcherConfig::default(),
        }
    }

    fn handler(
        fake: Arc<FakeSimplifierClient>,
    ) -> (Arc<InMemoryRunRegistry>, RunSimplificationHandler) {
        let registry = Arc::new(InMemoryRunRegistry::new());
        let handler = RunSimplificationHandler::new(registry.clone(), fake, settings());
        (registry, handler)
    }

    #[tokio::test]
    async fn test_end_to_end_45_segments() {
        let fake = Arc::new(FakeSimplifierClient::new(FakeTransform::Uppercase));
        let (registry, handler) = handler(fake.clone());

        let mut applied: HashMap<SegmentId, String> = HashMap::new();
        let summary = handler
            .handle(
                RunSimplificationCommand::new("s1", document_45()),
                |id, text| {
                    applied.insert(id, text.to_string());
                },
                &NoopReporter,
            )
            .await
            .unwrap();

        assert_eq!(summary.segment_count, 45);
        assert_eq!(summary.chunk_count, 34);
        assert_eq!(summary.batch_count, 4);
        assert_eq!(fake.batch_sizes(), vec![10, 10, 10, 4]);
        assert_eq!(summary.succeeded, 45);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.status, ExitStatus::Ok);

        assert_eq!(applied.len(), 45);
        for segment in &summary.segments {
            assert_eq!(
                applied[&segment.id()],
                segment.original_text().to_uppercase()
            );
        }

        let snapshot = registry.snapshot("s1").unwrap();
        assert!(!snapshot.active);
    }

    #[tokio::test]
    async fn test_lost_separator_is_partial_not_silent() {
        let fake = Arc::new(FakeSimplifierClient::new(FakeTransform::Identity).drop_separator());
        let (_registry, handler) = handler(fake);

        let mut count = 0;
        let summary = handler
            .handle(
                RunSimplificationCommand::new("s1", document_45()),
                |_, text| {
                    assert!(!text.is_empty());
                    count += 1;
                },
                &NoopReporter,
            )
            .await
            .unwrap();

        assert_eq!(summary.status, ExitStatus::Partial);
        assert_eq!(summary.mismatches.len(), 11);
        assert_eq!(summary.succeeded + summary.failed, 45);
        assert_eq!(count, summary.succeeded);
    }

    #[tokio::test]
    async fn test_failed_batch_reports_partial() {
        let fake = Arc::new(FakeSimplifierClient::new(FakeTransform::Identity).failing_calls([2]));
        let (_registry, handler) = handler(fake);

        let summary = handler
            .handle(
                RunSimplificationCommand::new("s1", document_45()),
                |_, _| {},
                &NoopReporter,
            )
            .await
            .unwrap();

        assert_eq!(summary.status, ExitStatus::Partial);
        assert!(summary.failed > 0);
        assert_eq!(summary.succeeded + summary.failed, 45);
        assert!(summary.failures.iter().all(|f| !f.cancelled));
    }

    #[tokio::test]
    async fn test_cancel_after_first_batch_then_rerun() {
        let fake = Arc::new(FakeSimplifierClient::new(FakeTransform::Identity));
        let (registry, handler) = handler(fake.clone());

        let token = CancellationToken::new();
        let trigger = token.clone();
        let reporter = move |event: &ProgressEvent| {
            if event.phase == ProgressPhase::BatchCompleted && event.batch_index == 1 {
                trigger.cancel();
            }
        };

        let mut cmd = RunSimplificationCommand::new("s1", document_45());
        cmd.cancel_token = Some(token);
        let summary = handler.handle(cmd, |_, _| {}, &reporter).await.unwrap();

        assert_eq!(summary.status, ExitStatus::Cancelled);
        assert_eq!(summary.batch_count, 1);
        assert!(summary.succeeded > 0);
        assert!(summary.failures.iter().all(|f| f.cancelled));
        assert_eq!(summary.succeeded + summary.failed, 45);
        assert!(!registry.snapshot("s1").unwrap().active);

        // 取消后可以立即开始新的运行
        let again = handler
            .handle(
                RunSimplificationCommand::new("s1", document_45()),
                |_, _| {},
                &NoopReporter,
            )
            .await
            .unwrap();
        assert_eq!(again.status, ExitStatus::Ok);
    }

    #[tokio::test]
    async fn test_second_run_rejected_while_active() {
        let fake = Arc::new(
            FakeSimplifierClient::new(FakeTransform::Identity)
                .with_delay(Duration::from_millis(300)),
        );
        let (registry, handler) = handler(fake);
        let handler = Arc::new(handler);

        let first = {
            let handler = handler.clone();
            tokio::spawn(async move {
                handler
                    .handle(
                        RunSimplificationCommand::new("s1", document_45()),
                        |_, _| {},
                        &NoopReporter,
                    )
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let before = registry.snapshot("s1").unwrap();

        let second = handler
            .handle(
                RunSimplificationCommand::new("s1", document_45()),
                |_, _| {},
                &NoopReporter,
            )
            .await;
        let err = second.unwrap_err();
        assert!(matches!(err, ApplicationError::AlreadyRunning(_)));
        assert_eq!(err.exit_status(), Some(ExitStatus::AlreadyRunning));

        let after = registry.snapshot("s1").unwrap();
        assert_eq!(before.run_id, after.run_id);
        assert!(after.active);
        assert!(!after.cancel_requested);

        // 其它会话不受影响
        let other = handler
            .handle(
                RunSimplificationCommand::new("s2", document_45()),
                |_, _| {},
                &NoopReporter,
            )
            .await;
        assert!(other.is_ok());

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.status, ExitStatus::Ok);
    }

    #[tokio::test]
    async fn test_no_content_releases_run() {
        let fake = Arc::new(FakeSimplifierClient::new(FakeTransform::Identity));
        let (registry, handler) = handler(fake.clone());

        let mut tree = DocumentTree::new("body", NodeCapabilities::block());
        let p = tree
            .append_element(tree.root(), "p", NodeCapabilities::block())
            .unwrap();
        tree.append_text(p, "Zu kurz").unwrap();

        let err = handler
            .handle(RunSimplificationCommand::new("s1", tree), |_, _| {}, &NoopReporter)
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::CollectionEmpty));
        assert_eq!(err.exit_status(), Some(ExitStatus::NoContent));
        assert!(fake.batch_sizes().is_empty());
        assert!(!registry.snapshot("s1").unwrap().active);
    }

    #[tokio::test]
    async fn test_run_finished_event_emitted() {
        let fake = Arc::new(FakeSimplifierClient::new(FakeTransform::Identity));
        let (_registry, handler) = handler(fake);
        let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = move |event: &ProgressEvent| sink.lock().unwrap().push(event.clone());

        let mut cmd = RunSimplificationCommand::new("s1", document_45());
        cmd.domain = Some("service.bund.de".to_string());
        handler.handle(cmd, |_, _| {}, &reporter).await.unwrap();

        let events = events.lock().unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.phase, ProgressPhase::RunFinished);
        assert_eq!(last.percent, 100);
        assert_eq!(last.batch_index, 4);
        assert_eq!(last.domain.as_deref(), Some("service.bund.de"));
    }

    #[tokio::test]
    async fn test_cancel_handler() {
        let registry = Arc::new(InMemoryRunRegistry::new());
        let cancel = CancelRunHandler::new(registry.clone());

        let missing = cancel.handle(CancelRunCommand {
            session_id: "s1".into(),
        });
        assert!(matches!(missing, Err(ApplicationError::NotFound { .. })));

        let token = CancellationToken::new();
        let run = RunGuard::acquire(registry.clone(), "s1", token.clone()).unwrap();
        let response = cancel
            .handle(CancelRunCommand {
                session_id: "s1".into(),
            })
            .unwrap();

        assert_eq!(response.run_id, run.run_id());
        assert!(token.is_cancelled());
    }
}

//! Batch Dispatcher - 批量请求编排
//!
//! 把 CombinedChunk 列表按 max_batch_size 切成批次，顺序调用简化服务：
//! - 每批发出前检查取消
//! - 每次调用有独立的超时（不影响后续批次）
//! - 用户取消与超时任一触发都会中止正在进行的调用
//! - 整批失败只标记该批条目，继续下一批
//!
//! 返回结果与输入 chunks 按下标一一对应，取消时未完成的条目标记为 Cancelled。

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::ports::{
    estimate_eta, percent_of, BatchRequest, ProgressEvent, ProgressPhase, ProgressReporterPort,
    RunGuard, SimplifierPort, SimplifyError,
};
use crate::domain::{
    BatchEntry, CombinedChunk, EntryFailure, Level, TargetLang, DEFAULT_MAX_CHUNK_LENGTH,
};

pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Dispatcher 配置
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// 单次请求最多携带的文本数
    pub max_batch_size: usize,
    /// 单批超时
    pub batch_timeout: Duration,
    /// 单个文本字符上限，超出的块不发送
    pub max_chunk_length: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
        }
    }
}

/// 单次运行的调用参数
#[derive(Debug, Clone, Copy)]
pub struct DispatchParams<'a> {
    pub target_lang: TargetLang,
    pub level: Level,
    /// 来源域名，仅用于进度事件
    pub domain: Option<&'a str>,
}

/// 分发结果
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// 与 chunks 下标对应
    pub entries: Vec<BatchEntry>,
    /// 实际处理（含失败）的批次数
    pub batches_sent: usize,
    pub total_batches: usize,
    pub cancelled: bool,
}

/// 批量分发器
pub struct BatchDispatcher {
    config: DispatcherConfig,
    simplifier: Arc<dyn SimplifierPort>,
}

impl BatchDispatcher {
    pub fn new(config: DispatcherConfig, simplifier: Arc<dyn SimplifierPort>) -> Self {
        Self { config, simplifier }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn total_batches(&self, chunk_count: usize) -> usize {
        chunk_count.div_ceil(self.config.max_batch_size.max(1))
    }

    /// 顺序执行所有批次
    pub async fn run(
        &self,
        run: &RunGuard,
        chunks: &[CombinedChunk],
        params: DispatchParams<'_>,
        reporter: &dyn ProgressReporterPort,
    ) -> DispatchOutcome {
        let batch_size = self.config.max_batch_size.max(1);
        let total_batches = self.total_batches(chunks.len());
        let total_segments: usize = chunks.iter().map(CombinedChunk::member_count).sum();

        run.set_totals(total_segments, total_batches);

        let mut progress = Progress {
            run,
            params,
            reporter,
            total_batches,
            total_segments,
            completed_segments: 0,
            failed_segments: 0,
            durations: Vec::with_capacity(total_batches),
        };
        progress.emit(ProgressPhase::RunStarted, 0);

        let mut entries: Vec<BatchEntry> = Vec::with_capacity(chunks.len());
        let mut batches_sent = 0;
        let mut cancelled = false;

        for (i, batch) in chunks.chunks(batch_size).enumerate() {
            let batch_index = i + 1;

            if run.is_cancelled() {
                tracing::info!(
                    run_id = %run.run_id(),
                    batch_index,
                    total_batches,
                    "Run cancelled before batch"
                );
                cancelled = true;
                break;
            }

            progress.emit(ProgressPhase::BatchStarted, batch_index);

            let started = Instant::now();
            let batch_entries = self.dispatch_batch(run, batch, &params).await;
            let elapsed = started.elapsed();
            batches_sent += 1;

            let interrupted = batch_entries.iter().any(BatchEntry::is_cancelled);
            for (chunk, entry) in batch.iter().zip(&batch_entries) {
                progress.completed_segments += chunk.member_count();
                if !entry.is_success() {
                    progress.failed_segments += chunk.member_count();
                }
            }
            entries.extend(batch_entries);

            if interrupted {
                cancelled = true;
                progress.emit(ProgressPhase::BatchCompleted, batch_index);
                break;
            }

            progress.durations.push(elapsed);
            run.record_batch(progress.completed_segments, elapsed);

            tracing::info!(
                run_id = %run.run_id(),
                batch_index,
                total_batches,
                items = batch.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Batch completed"
            );
            progress.emit(ProgressPhase::BatchCompleted, batch_index);
        }

        if cancelled {
            let outstanding = chunks.len() - entries.len();
            entries.extend(
                std::iter::repeat(BatchEntry::Failed(EntryFailure::Cancelled)).take(outstanding),
            );
        }

        DispatchOutcome {
            entries,
            batches_sent,
            total_batches,
            cancelled,
        }
    }

    /// 发送单个批次，返回与 batch 下标对应的结果
    async fn dispatch_batch(
        &self,
        run: &RunGuard,
        batch: &[CombinedChunk],
        params: &DispatchParams<'_>,
    ) -> Vec<BatchEntry> {
        let mut slots: Vec<Option<BatchEntry>> = Vec::with_capacity(batch.len());
        let mut texts: Vec<String> = Vec::with_capacity(batch.len());

        for chunk in batch {
            if chunk.char_len() > self.config.max_chunk_length {
                tracing::warn!(
                    run_id = %run.run_id(),
                    length = chunk.char_len(),
                    max = self.config.max_chunk_length,
                    "Chunk exceeds max length, not sent"
                );
                slots.push(Some(BatchEntry::Failed(EntryFailure::ChunkTooLong(
                    chunk.char_len(),
                ))));
            } else {
                texts.push(chunk.combined_text().to_string());
                slots.push(None);
            }
        }

        if texts.is_empty() {
            return slots.into_iter().flatten().collect();
        }

        let request = BatchRequest::new(texts, params.target_lang, params.level);
        let result = self.call(run, &request).await;

        let results: Vec<BatchEntry> = match result {
            Ok(results) if results.len() == request.len() => results,
            Ok(results) => {
                let err = SimplifyError::InvalidResponse(format!(
                    "expected {} results, got {}",
                    request.len(),
                    results.len()
                ));
                tracing::warn!(run_id = %run.run_id(), error = %err, "Batch failed");
                vec![BatchEntry::Failed(EntryFailure::from(&err)); request.len()]
            }
            Err(SimplifyError::Cancelled) => {
                vec![BatchEntry::Failed(EntryFailure::Cancelled); request.len()]
            }
            Err(e) => {
                tracing::warn!(run_id = %run.run_id(), error = %e, "Batch failed");
                vec![BatchEntry::Failed(EntryFailure::from(&e)); request.len()]
            }
        };

        // 把发送结果按原顺序填回空位
        let mut sent = results.into_iter();
        slots
            .into_iter()
            .map(|slot| match slot {
                Some(entry) => entry,
                None => sent
                    .next()
                    .unwrap_or(BatchEntry::Failed(EntryFailure::InvalidResponse(
                        "missing result".to_string(),
                    ))),
            })
            .collect()
    }

    /// 单次远程调用：用户取消与本次超时谁先到就中止
    async fn call(
        &self,
        run: &RunGuard,
        request: &BatchRequest,
    ) -> Result<Vec<BatchEntry>, SimplifyError> {
        tokio::select! {
            biased;
            _ = run.cancel_token().cancelled() => Err(SimplifyError::Cancelled),
            result = tokio::time::timeout(
                self.config.batch_timeout,
                self.simplifier.simplify_batch(request),
            ) => match result {
                Ok(inner) => inner,
                Err(_) => Err(SimplifyError::Timeout),
            },
        }
    }
}

/// 进度状态（仅在一次 run 内存在）
struct Progress<'a> {
    run: &'a RunGuard,
    params: DispatchParams<'a>,
    reporter: &'a dyn ProgressReporterPort,
    total_batches: usize,
    total_segments: usize,
    completed_segments: usize,
    failed_segments: usize,
    durations: Vec<Duration>,
}

impl Progress<'_> {
    fn emit(&self, phase: ProgressPhase, batch_index: usize) {
        // 批次开始时该批尚未完成，仍计入剩余
        let remaining = match phase {
            ProgressPhase::BatchStarted => self
                .total_batches
                .saturating_sub(batch_index.saturating_sub(1)),
            _ => self.total_batches.saturating_sub(batch_index),
        };
        let eta_seconds = match phase {
            ProgressPhase::RunStarted => None,
            _ => estimate_eta(&self.durations, remaining),
        };

        self.reporter.report(&ProgressEvent {
            session_id: self.run.session_id().to_string(),
            run_id: self.run.run_id(),
            phase,
            percent: percent_of(self.completed_segments, self.total_segments),
            batch_index,
            total_batches: self.total_batches,
            completed_segments: self.completed_segments,
            total_segments: self.total_segments,
            eta_seconds,
            failed_count: self.failed_segments,
            domain: self.params.domain.map(str::to_string),
        });
    }
}

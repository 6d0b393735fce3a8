//! Fake Simplifier Client - 用于测试和离线运行的简化客户端
//!
//! 不调用远程服务，按配置的规则变换文本。
//! 与远程接口一致：少于 10 个字符的文本逐条拒绝。

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{BatchRequest, SimplifierPort, SimplifyError};
use crate::domain::{BatchEntry, EntryFailure, SEPARATOR};

/// 远程服务接受的最短文本
const MIN_TEXT_LENGTH: usize = 10;

/// 文本变换规则
#[derive(Debug, Clone)]
pub enum FakeTransform {
    /// 原样返回
    Identity,
    Uppercase,
    /// 在每段前加前缀（保留分隔符）
    Prefix(String),
}

impl FakeTransform {
    fn apply(&self, text: &str) -> String {
        match self {
            FakeTransform::Identity => text.to_string(),
            FakeTransform::Uppercase => text.to_uppercase(),
            FakeTransform::Prefix(prefix) => text
                .split(SEPARATOR)
                .map(|part| format!("{}{}", prefix, part))
                .collect::<Vec<_>>()
                .join(SEPARATOR),
        }
    }
}

/// Fake Simplifier Client
pub struct FakeSimplifierClient {
    transform: FakeTransform,
    delay: Option<Duration>,
    /// 只对这些调用序号（从 1 开始）施加延迟；为空时所有调用都延迟
    delayed_calls: HashSet<usize>,
    failing_calls: HashSet<usize>,
    drop_separator: bool,
    truncate_to: Option<usize>,
    calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl FakeSimplifierClient {
    pub fn new(transform: FakeTransform) -> Self {
        Self {
            transform,
            delay: None,
            delayed_calls: HashSet::new(),
            failing_calls: HashSet::new(),
            drop_separator: false,
            truncate_to: None,
            calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    /// 模拟调用延迟
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn delayed_calls(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.delayed_calls = calls.into_iter().collect();
        self
    }

    /// 指定的调用序号返回网络错误
    pub fn failing_calls(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.failing_calls = calls.into_iter().collect();
        self
    }

    /// 模拟远程服务丢失合并分隔符
    pub fn drop_separator(mut self) -> Self {
        self.drop_separator = true;
        self
    }

    /// 只返回前 n 条结果
    pub fn truncate_results(mut self, n: usize) -> Self {
        self.truncate_to = Some(n);
        self
    }

    /// 已收到的各批次大小（按调用顺序）
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .map(|sizes| sizes.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn simplify_one(&self, text: &str) -> BatchEntry {
        if text.trim().chars().count() < MIN_TEXT_LENGTH {
            return BatchEntry::Failed(EntryFailure::Rejected(
                "Text too short to simplify (minimum 10 characters)".to_string(),
            ));
        }
        let mut simplified = self.transform.apply(text);
        if self.drop_separator {
            simplified = simplified.replace(SEPARATOR, " ");
        }
        BatchEntry::Simplified(simplified)
    }
}

#[async_trait]
impl SimplifierPort for FakeSimplifierClient {
    async fn simplify_batch(&self, request: &BatchRequest) -> Result<Vec<BatchEntry>, SimplifyError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut sizes) = self.batch_sizes.lock() {
            sizes.push(request.len());
        }

        tracing::debug!(call, items = request.len(), "FakeSimplifierClient: batch received");

        if let Some(delay) = self.delay {
            if self.delayed_calls.is_empty() || self.delayed_calls.contains(&call) {
                tokio::time::sleep(delay).await;
            }
        }

        if self.failing_calls.contains(&call) {
            return Err(SimplifyError::NetworkError(format!(
                "simulated failure on call {}",
                call
            )));
        }

        let mut entries: Vec<BatchEntry> =
            request.texts.iter().map(|t| self.simplify_one(t)).collect();
        if let Some(n) = self.truncate_to {
            entries.truncate(n);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Level, TargetLang};

    #[tokio::test]
    async fn test_fake_rejects_short_texts_per_item() {
        let fake = FakeSimplifierClient::new(FakeTransform::Prefix("> ".into()));
        let request = BatchRequest::new(
            vec!["kurz".into(), "Ein Satz.\n\nNoch ein Satz.".into()],
            TargetLang::De,
            Level::Easy,
        );

        let entries = fake.simplify_batch(&request).await.unwrap();

        assert!(matches!(entries[0], BatchEntry::Failed(EntryFailure::Rejected(_))));
        assert_eq!(
            entries[1],
            BatchEntry::Simplified("> Ein Satz.\n\n> Noch ein Satz.".into())
        );
        assert_eq!(fake.batch_sizes(), vec![2]);
        assert_eq!(fake.call_count(), 1);
    }
}

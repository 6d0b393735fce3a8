//! Caching Simplifier - 带结果缓存的 SimplifierPort 装饰器
//!
//! 命中缓存的文本不再发送；只有未命中的文本组成新的批量请求，
//! 成功结果写回缓存。缓存读写失败只记录日志，不影响简化本身。

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::ports::{
    generate_cache_key, BatchRequest, SimplificationCachePort, SimplifierPort, SimplifyError,
};
use crate::domain::BatchEntry;

pub struct CachingSimplifier {
    inner: Arc<dyn SimplifierPort>,
    cache: Arc<dyn SimplificationCachePort>,
}

impl CachingSimplifier {
    pub fn new(inner: Arc<dyn SimplifierPort>, cache: Arc<dyn SimplificationCachePort>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl SimplifierPort for CachingSimplifier {
    async fn simplify_batch(&self, request: &BatchRequest) -> Result<Vec<BatchEntry>, SimplifyError> {
        let keys: Vec<String> = request
            .texts
            .iter()
            .map(|text| generate_cache_key(text, request.target_lang, request.level))
            .collect();

        let mut slots: Vec<Option<BatchEntry>> = Vec::with_capacity(keys.len());
        let mut misses: Vec<usize> = Vec::new();

        for (i, key) in keys.iter().enumerate() {
            match self.cache.get(key).await {
                Ok(Some(text)) => slots.push(Some(BatchEntry::Simplified(text))),
                Ok(None) => {
                    slots.push(None);
                    misses.push(i);
                }
                Err(e) => {
                    tracing::warn!(cache_key = %key, error = %e, "Cache read failed");
                    slots.push(None);
                    misses.push(i);
                }
            }
        }

        tracing::debug!(
            items = request.len(),
            hits = request.len() - misses.len(),
            "Simplification cache lookup"
        );

        if !misses.is_empty() {
            let miss_request = BatchRequest::new(
                misses.iter().map(|&i| request.texts[i].clone()).collect(),
                request.target_lang,
                request.level,
            );
            let results = self.inner.simplify_batch(&miss_request).await?;
            if results.len() != miss_request.len() {
                return Err(SimplifyError::InvalidResponse(format!(
                    "expected {} results, got {}",
                    miss_request.len(),
                    results.len()
                )));
            }

            for (&i, entry) in misses.iter().zip(results) {
                if let BatchEntry::Simplified(text) = &entry {
                    if let Err(e) = self.cache.put(&keys[i], text).await {
                        tracing::warn!(cache_key = %keys[i], error = %e, "Cache write failed");
                    }
                }
                slots[i] = Some(entry);
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| SimplifyError::InvalidResponse("missing result".into())))
            .collect()
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }
}

//! Sled 持久化 - 简化结果 LRU 缓存

mod simplification_cache;

pub use simplification_cache::{SledCacheConfig, SledSimplificationCache};
